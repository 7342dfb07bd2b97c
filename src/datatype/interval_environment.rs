/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt;

use im::OrdMap;
use log::trace;

use crate::datatype::AbstractDomain;
use crate::datatype::Interval;
use crate::datatype::NumericDomain;
use crate::error::AnalysisError;
use crate::error::Result;
use crate::linear::LinearConstraint;
use crate::linear::LinearExpr;

/*
 * An interval environment maps the variables of a program to ranges:
 *
 *   {"i" -> [0, 10], "x" -> [-1, 1], ...}
 *
 * It is a nonrelational domain: each variable is bounded independently and
 * constraints relating several variables cannot be expressed.
 *
 * A variable without a binding is unconstrained, so every lattice operation
 * treats it as [-inf, inf]. Unlike a classic abstract environment, bindings
 * to [-inf, inf] are kept explicitly: they record that the variable has been
 * defined along some path, which is what assignments check when they read
 * it. Bottom means the program point is unreachable; it is the only empty
 * state, intervals themselves are never empty.
 *
 * Bindings live in a persistent map, so cloning a state at a branch is cheap
 * and the clones evolve independently.
 */
#[derive(Clone, Debug)]
pub enum IntervalEnvironment {
    Value(OrdMap<String, Interval>),
    Bottom,
}

impl IntervalEnvironment {
    /// Seeds an environment from `(variable, (lo, hi))` pairs.
    pub fn from_bounds<S, I>(bounds: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, (f64, f64))>,
    {
        let seeds = bounds
            .into_iter()
            .map(|(var, (lo, hi))| Ok((var.into(), Interval::try_new(lo, hi)?)))
            .collect::<Result<Vec<(String, Interval)>>>()?;
        Ok(Self::init_state(seeds))
    }

    pub fn bindings(&self) -> Option<&OrdMap<String, Interval>> {
        match self {
            IntervalEnvironment::Value(ref map) => Some(map),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.bindings().map_or(0, |map| map.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The range of a tracked variable. `None` for untracked variables and
    /// for every variable of the bottom state.
    pub fn get(&self, variable: &str) -> Option<Interval> {
        self.bindings()
            .and_then(|map| map.get(variable))
            .copied()
    }

    pub fn bounds(&self, variable: &str) -> Option<(f64, f64)> {
        self.get(variable).map(|interval| (interval.lo(), interval.hi()))
    }

    pub fn set(&mut self, variable: impl Into<String>, interval: Interval) {
        if let IntervalEnvironment::Value(map) = self {
            map.insert(variable.into(), interval);
        }
    }

    /// Replaces the range of `variable` (unconstrained if untracked) by the
    /// result of `op`. `None` means no value is left and the whole
    /// environment becomes bottom.
    pub fn update(&mut self, variable: &str, op: impl FnOnce(Interval) -> Option<Interval>) {
        use IntervalEnvironment::*;

        if let Value(map) = self {
            let current = map.get(variable).copied().unwrap_or(Interval::TOP);
            match op(current) {
                Some(interval) => {
                    map.insert(variable.to_owned(), interval);
                }
                None => *self = Bottom,
            }
        }
    }

    fn join_like_operation(
        lhs: &mut Self,
        rhs: Self,
        operation: impl Fn(&Interval, &Interval) -> Interval,
    ) {
        use IntervalEnvironment::*;

        match (&mut *lhs, rhs) {
            (Value(l_map), Value(r_map)) => {
                let mut result = OrdMap::new();
                for (var, l_itv) in l_map.iter() {
                    let value = match r_map.get(var) {
                        Some(r_itv) => operation(l_itv, r_itv),
                        None => Interval::TOP,
                    };
                    result.insert(var.clone(), value);
                }
                for (var, _) in r_map.iter() {
                    if !l_map.contains_key(var) {
                        result.insert(var.clone(), Interval::TOP);
                    }
                }
                *l_map = result;
            }
            (Bottom, rhs) => *lhs = rhs,
            (_, Bottom) => {}
        }
    }

    fn meet_like_operation(
        lhs: &mut Self,
        rhs: Self,
        operation: impl Fn(&Interval, &Interval) -> Option<Interval>,
    ) {
        use IntervalEnvironment::*;

        let r_map = match rhs {
            Value(map) => map,
            Bottom => {
                *lhs = Bottom;
                return;
            }
        };
        let l_map = match lhs {
            Value(map) => map,
            Bottom => return,
        };

        for (var, r_itv) in r_map.into_iter() {
            // A missing binding is top, the identity of meet-like operations.
            let value = match l_map.get(&var) {
                Some(l_itv) => operation(l_itv, &r_itv),
                None => Some(r_itv),
            };
            match value {
                Some(interval) => {
                    l_map.insert(var, interval);
                }
                None => {
                    *lhs = Bottom;
                    return;
                }
            }
        }
    }
}

impl PartialEq for IntervalEnvironment {
    fn eq(&self, other: &Self) -> bool {
        use IntervalEnvironment::*;

        let same_bindings = |lhs: &OrdMap<String, Interval>, rhs: &OrdMap<String, Interval>| {
            lhs.iter()
                .all(|(var, itv)| rhs.get(var).copied().unwrap_or(Interval::TOP) == *itv)
        };

        match (self, other) {
            (Bottom, Bottom) => true,
            (Value(l_map), Value(r_map)) => {
                same_bindings(l_map, r_map) && same_bindings(r_map, l_map)
            }
            _ => false,
        }
    }
}

impl Eq for IntervalEnvironment {}

impl AbstractDomain for IntervalEnvironment {
    fn bottom() -> Self {
        IntervalEnvironment::Bottom
    }

    fn top() -> Self {
        IntervalEnvironment::Value(OrdMap::new())
    }

    fn is_bottom(&self) -> bool {
        matches!(self, IntervalEnvironment::Bottom)
    }

    fn is_top(&self) -> bool {
        match self {
            IntervalEnvironment::Value(map) => map.values().all(Interval::is_top),
            _ => false,
        }
    }

    fn leq(&self, rhs: &Self) -> bool {
        use IntervalEnvironment::*;
        match (self, rhs) {
            (Bottom, _) => true,
            (_, Bottom) => false,
            (Value(l_map), Value(r_map)) => r_map.iter().all(|(var, r_itv)| {
                l_map
                    .get(var)
                    .copied()
                    .unwrap_or(Interval::TOP)
                    .is_subset(r_itv)
            }),
        }
    }

    fn join_with(&mut self, rhs: Self) {
        Self::join_like_operation(self, rhs, |l, r| l.hull(r));
    }

    fn meet_with(&mut self, rhs: Self) {
        Self::meet_like_operation(self, rhs, |l, r| l.intersect(r));
    }

    fn widen_with(&mut self, rhs: Self) {
        Self::join_like_operation(self, rhs, |l, r| l.widen(r));
    }

    fn narrow_with(&mut self, rhs: Self) {
        Self::meet_like_operation(self, rhs, |l, r| Some(l.narrow(r)));
    }
}

impl NumericDomain for IntervalEnvironment {
    type Seed = Interval;

    fn init_state<S, I>(seeds: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Interval)>,
    {
        IntervalEnvironment::Value(
            seeds
                .into_iter()
                .map(|(var, interval)| (var.into(), interval))
                .collect(),
        )
    }

    fn assign(&mut self, var: &str, expr: &LinearExpr) -> Result<()> {
        let map = match self {
            IntervalEnvironment::Value(map) => map,
            IntervalEnvironment::Bottom => return Ok(()),
        };

        let value = expr.terms().try_fold(
            Interval::enclosing(expr.offset()),
            |acc, (name, coeff)| match map.get(name) {
                Some(interval) => Ok(acc + interval.scale(coeff)),
                None => Err(AnalysisError::UnboundVariable {
                    name: name.to_owned(),
                }),
            },
        )?;
        map.insert(var.to_owned(), value);
        Ok(())
    }

    fn meet_constraint(&mut self, constraint: &LinearConstraint) -> Result<()> {
        if self.is_bottom() {
            return Ok(());
        }

        if let Some(holds) = constraint.constant_truth() {
            if !holds {
                *self = IntervalEnvironment::Bottom;
            }
            return Ok(());
        }

        let expr = constraint.expr();
        match expr.single_variable() {
            // coeff * var + offset OP 0  <=>  var OP' -offset / coeff
            Some((var, coeff)) => {
                let op = if coeff < 0.0 {
                    constraint.op().flip()
                } else {
                    constraint.op()
                };
                let bound = -expr.offset() / coeff;
                self.update(var, |current| current.restrict(op, bound));
            }
            None => trace!(
                "`{}` relates several variables, interval state left unchanged",
                constraint
            ),
        }
        Ok(())
    }

    fn unify(&mut self, other: &mut Self) {
        use IntervalEnvironment::*;

        if let (Value(l_map), Value(r_map)) = (self, other) {
            for var in r_map.keys() {
                if !l_map.contains_key(var) {
                    l_map.insert(var.clone(), Interval::TOP);
                }
            }
            for var in l_map.keys() {
                if !r_map.contains_key(var) {
                    r_map.insert(var.clone(), Interval::TOP);
                }
            }
        }
    }

    fn variables(&self) -> Vec<String> {
        self.bindings()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for IntervalEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalEnvironment::Bottom => f.write_str("_|_"),
            IntervalEnvironment::Value(map) => {
                f.write_str("{")?;
                for (i, (var, interval)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} -> {}", var, interval)?;
                }
                f.write_str("}")
            }
        }
    }
}
