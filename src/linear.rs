/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::cmp::Ordering;
use std::fmt;

use smallvec::SmallVec;

/// Number of terms stored inline before a linear expression spills to the
/// heap. Most program expressions mention only a handful of variables.
pub const INLINE_TERMS: usize = 4;

/*
 * An affine expression over real-valued program variables:
 *
 *   c_1 * v_1 + ... + c_n * v_n + offset
 *
 * Terms are kept sorted by variable name with unique names and non-zero
 * coefficients. A variable without a term has coefficient 0, so two
 * expressions are semantically equal exactly when they are structurally
 * equal. Values are immutable; every operation returns a new expression.
 */
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearExpr {
    terms: SmallVec<[(String, f64); INLINE_TERMS]>,
    offset: f64,
}

impl LinearExpr {
    pub fn constant(offset: f64) -> Self {
        Self {
            terms: SmallVec::new(),
            offset,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        let mut terms = SmallVec::new();
        terms.push((name.into(), 1.0));
        Self { terms, offset: 0.0 }
    }

    /// Builds an expression from possibly repeated terms; coefficients of
    /// repeated variables are summed.
    pub fn from_terms<S, I>(terms: I, offset: f64) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, f64)>,
    {
        terms
            .into_iter()
            .fold(Self::constant(offset), |acc, (name, coeff)| {
                acc.plus(&Self::var(name).scale(coeff))
            })
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn coeff(&self, name: &str) -> f64 {
        self.terms
            .binary_search_by(|(var, _)| var.as_str().cmp(name))
            .map(|idx| self.terms[idx].1)
            .unwrap_or(0.0)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.terms.iter().map(|(var, coeff)| (var.as_str(), *coeff))
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> + '_ {
        self.terms.iter().map(|(var, _)| var.as_str())
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// False when coefficient arithmetic overflowed into NaN (`inf - inf`).
    /// Infinite coefficients and offsets are still defined.
    pub fn is_defined(&self) -> bool {
        !self.offset.is_nan() && self.terms.iter().all(|(_, coeff)| !coeff.is_nan())
    }

    /// The single `(variable, coefficient)` term if there is exactly one.
    pub fn single_variable(&self) -> Option<(&str, f64)> {
        match self.terms.as_slice() {
            [(var, coeff)] => Some((var.as_str(), *coeff)),
            _ => None,
        }
    }

    pub fn scale(&self, factor: f64) -> Self {
        let terms = self
            .terms
            .iter()
            .map(|(var, coeff)| (var.clone(), mul_coeff(*coeff, factor)))
            .filter(|(_, coeff)| *coeff != 0.0)
            .collect();
        Self {
            terms,
            offset: mul_coeff(self.offset, factor),
        }
    }

    pub fn plus(&self, rhs: &Self) -> Self {
        self.combine(rhs, 1.0)
    }

    pub fn minus(&self, rhs: &Self) -> Self {
        self.combine(rhs, -1.0)
    }

    /// `self + factor * rhs`, merging the two sorted term lists.
    pub fn combine(&self, rhs: &Self, factor: f64) -> Self {
        let mut terms: SmallVec<[(String, f64); INLINE_TERMS]> =
            SmallVec::with_capacity(self.terms.len() + rhs.terms.len());
        let (mut i, mut j) = (0, 0);

        loop {
            let term = match (self.terms.get(i), rhs.terms.get(j)) {
                (None, None) => break,
                (Some((l_var, l_coeff)), None) => {
                    i += 1;
                    (l_var.clone(), *l_coeff)
                }
                (None, Some((r_var, r_coeff))) => {
                    j += 1;
                    (r_var.clone(), mul_coeff(*r_coeff, factor))
                }
                (Some((l_var, l_coeff)), Some((r_var, r_coeff))) => match l_var.cmp(r_var) {
                    Ordering::Less => {
                        i += 1;
                        (l_var.clone(), *l_coeff)
                    }
                    Ordering::Greater => {
                        j += 1;
                        (r_var.clone(), mul_coeff(*r_coeff, factor))
                    }
                    Ordering::Equal => {
                        i += 1;
                        j += 1;
                        (l_var.clone(), l_coeff + mul_coeff(*r_coeff, factor))
                    }
                },
            };
            if term.1 != 0.0 {
                terms.push(term);
            }
        }

        Self {
            terms,
            offset: self.offset + mul_coeff(rhs.offset, factor),
        }
    }
}

// Zero absorbs infinite coefficients, as for interval bounds.
fn mul_coeff(coeff: f64, factor: f64) -> f64 {
    if coeff == 0.0 || factor == 0.0 {
        0.0
    } else {
        coeff * factor
    }
}

impl fmt::Display for LinearExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (var, coeff)) in self.terms.iter().enumerate() {
            let magnitude = coeff.abs();
            if i == 0 {
                if *coeff < 0.0 {
                    f.write_str("-")?;
                }
            } else if *coeff < 0.0 {
                f.write_str(" - ")?;
            } else {
                f.write_str(" + ")?;
            }
            if magnitude == 1.0 {
                f.write_str(var)?;
            } else {
                write!(f, "{}*{}", magnitude, var)?;
            }
        }

        if self.terms.is_empty() {
            write!(f, "{}", self.offset)
        } else if self.offset < 0.0 {
            write!(f, " - {}", -self.offset)
        } else if self.offset > 0.0 {
            write!(f, " + {}", self.offset)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Le,
    Lt,
    Ge,
    Gt,
    Eq,
    Ne,
}

impl Op {
    /// Boolean complement of the comparison.
    pub fn negate(self) -> Self {
        match self {
            Op::Le => Op::Gt,
            Op::Lt => Op::Ge,
            Op::Ge => Op::Lt,
            Op::Gt => Op::Le,
            Op::Eq => Op::Ne,
            Op::Ne => Op::Eq,
        }
    }

    /// The comparison obtained after multiplying both sides by a negative
    /// number.
    pub fn flip(self) -> Self {
        match self {
            Op::Le => Op::Ge,
            Op::Lt => Op::Gt,
            Op::Ge => Op::Le,
            Op::Gt => Op::Lt,
            Op::Eq => Op::Eq,
            Op::Ne => Op::Ne,
        }
    }

    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Op::Le => lhs <= rhs,
            Op::Lt => lhs < rhs,
            Op::Ge => lhs >= rhs,
            Op::Gt => lhs > rhs,
            Op::Eq => lhs == rhs,
            Op::Ne => lhs != rhs,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Op::Le => "<=",
            Op::Lt => "<",
            Op::Ge => ">=",
            Op::Gt => ">",
            Op::Eq => "==",
            Op::Ne => "!=",
        };
        f.write_str(symbol)
    }
}

/// `expr OP 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    expr: LinearExpr,
    op: Op,
}

impl LinearConstraint {
    /// `lhs OP rhs`, normalized to `lhs - rhs OP 0`.
    pub fn new(lhs: &LinearExpr, op: Op, rhs: &LinearExpr) -> Self {
        Self {
            expr: lhs.minus(rhs),
            op,
        }
    }

    pub fn from_expr(expr: LinearExpr, op: Op) -> Self {
        Self { expr, op }
    }

    pub fn expr(&self) -> &LinearExpr {
        &self.expr
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn negate(&self) -> Self {
        Self {
            expr: self.expr.clone(),
            op: self.op.negate(),
        }
    }

    /// Truth value of a constraint that mentions no variable.
    pub fn constant_truth(&self) -> Option<bool> {
        if self.expr.is_constant() {
            Some(self.op.holds(self.expr.offset(), 0.0))
        } else {
            None
        }
    }
}

impl fmt::Display for LinearConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} 0", self.expr, self.op)
    }
}
