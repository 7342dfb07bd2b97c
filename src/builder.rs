/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

/*
 * Translation of program expressions and conditions into linear forms.
 *
 * Only the affine fragment is accepted: sums and differences of linear
 * terms, negation, and products where one side is a numeric literal
 * (possibly under unary minus). A product of two symbolic operands is
 * reported as non-linear instead of being approximated, and every other
 * node shape is refused.
 */

use crate::ast::BinOp;
use crate::ast::CmpOp;
use crate::ast::Cond;
use crate::ast::Expr;
use crate::error::AnalysisError;
use crate::error::Result;
use crate::linear::LinearConstraint;
use crate::linear::LinearExpr;
use crate::linear::Op;

pub fn build_expr(expr: &Expr) -> Result<LinearExpr> {
    defined(linearize(expr)?, expr)
}

fn linearize(expr: &Expr) -> Result<LinearExpr> {
    match expr {
        Expr::Var(name) => Ok(LinearExpr::var(name.as_str())),
        Expr::Num(value) => Ok(LinearExpr::constant(finite(*value, expr)?)),
        Expr::Neg(operand) => Ok(linearize(operand)?.scale(-1.0)),
        Expr::Binary { op, lhs, rhs } => match op {
            BinOp::Add => Ok(linearize(lhs)?.plus(&linearize(rhs)?)),
            BinOp::Sub => Ok(linearize(lhs)?.minus(&linearize(rhs)?)),
            BinOp::Mul => {
                if let Some(factor) = literal_value(lhs) {
                    Ok(linearize(rhs)?.scale(finite(factor, lhs)?))
                } else if let Some(factor) = literal_value(rhs) {
                    Ok(linearize(lhs)?.scale(finite(factor, rhs)?))
                } else {
                    Err(AnalysisError::NonLinearExpression {
                        expr: expr.to_string(),
                    })
                }
            }
            BinOp::Div | BinOp::Rem | BinOp::Pow => Err(AnalysisError::UnsupportedExpression {
                expr: expr.to_string(),
            }),
        },
        Expr::Call { .. } => Err(AnalysisError::UnsupportedExpression {
            expr: expr.to_string(),
        }),
    }
}

pub fn build_constraint(cond: &Cond) -> Result<LinearConstraint> {
    match cond {
        Cond::Compare { lhs, op, rhs } => {
            let op = linear_op(*op)?;
            let constraint = LinearConstraint::new(&build_expr(lhs)?, op, &build_expr(rhs)?);
            if constraint.expr().is_defined() {
                Ok(constraint)
            } else {
                Err(AnalysisError::UnsupportedExpression {
                    expr: cond.to_string(),
                })
            }
        }
        Cond::Not(_) | Cond::And(..) | Cond::Or(..) | Cond::Bool(_) => {
            Err(AnalysisError::UnsupportedExpression {
                expr: cond.to_string(),
            })
        }
    }
}

pub fn linear_op(op: CmpOp) -> Result<Op> {
    match op {
        CmpOp::Lt => Ok(Op::Lt),
        CmpOp::Le => Ok(Op::Le),
        CmpOp::Gt => Ok(Op::Gt),
        CmpOp::Ge => Ok(Op::Ge),
        CmpOp::Eq => Ok(Op::Eq),
        CmpOp::Ne => Ok(Op::Ne),
        CmpOp::In | CmpOp::NotIn => Err(AnalysisError::UnsupportedComparison { op }),
    }
}

/// Value of a literal, or of a literal under any number of unary minuses.
fn literal_value(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Num(value) => Some(*value),
        Expr::Neg(operand) => literal_value(operand).map(|value| -value),
        _ => None,
    }
}

// Folding finite coefficients can still cancel two overflows into NaN.
fn defined(linear: LinearExpr, expr: &Expr) -> Result<LinearExpr> {
    if linear.is_defined() {
        Ok(linear)
    } else {
        Err(AnalysisError::UnsupportedExpression {
            expr: expr.to_string(),
        })
    }
}

// Infinite or NaN literals would poison the interval arithmetic (0 * inf).
fn finite(value: f64, expr: &Expr) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnalysisError::UnsupportedExpression {
            expr: expr.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Expr {
        Expr::var(name)
    }

    #[test]
    fn test_affine_expression() {
        let expr = build_expr(&(var("a") + 1.0)).unwrap();
        assert_eq!(expr.terms().collect::<Vec<_>>(), vec![("a", 1.0)]);
        assert_eq!(expr.offset(), 1.0);
    }

    #[test]
    fn test_product_of_variables_is_rejected() {
        let expr = Expr::num(2.0) * var("a") * var("b");
        assert!(matches!(
            build_expr(&expr),
            Err(AnalysisError::NonLinearExpression { .. })
        ));
    }

    #[test]
    fn test_scaling_by_negated_literal() {
        // x = 2*a - b - 3; y = -2*x + 1
        let x = build_expr(&(Expr::num(2.0) * var("a") - var("b") - 3.0)).unwrap();
        assert_eq!(x, LinearExpr::from_terms([("a", 2.0), ("b", -1.0)], -3.0));

        let y = build_expr(&(-Expr::num(2.0) * var("x") + 1.0)).unwrap();
        assert_eq!(y, LinearExpr::from_terms([("x", -2.0)], 1.0));

        let z = build_expr(&(var("x") * -(-Expr::num(3.0)))).unwrap();
        assert_eq!(z, LinearExpr::from_terms([("x", 3.0)], 0.0));
    }

    #[test]
    fn test_constant_folding() {
        let expr = build_expr(&(Expr::num(2.0) * Expr::num(4.0) - var("a"))).unwrap();
        assert_eq!(expr, LinearExpr::from_terms([("a", -1.0)], 8.0));
    }

    #[test]
    fn test_subtraction_cancels_terms() {
        let expr = build_expr(&((var("a") + var("b")) - (var("a") - 2.0))).unwrap();
        assert_eq!(expr, LinearExpr::from_terms([("b", 1.0)], 2.0));
    }

    #[test]
    fn test_unsupported_shapes() {
        for expr in [
            var("a") / 2.0,
            Expr::binary(BinOp::Rem, var("a"), 2.0),
            Expr::binary(BinOp::Pow, var("a"), 2.0),
            Expr::call("abs", vec![var("a")]),
            Expr::num(f64::INFINITY),
        ] {
            assert!(
                matches!(
                    build_expr(&expr),
                    Err(AnalysisError::UnsupportedExpression { .. })
                ),
                "{} should be unsupported",
                expr
            );
        }
    }

    #[test]
    fn test_constraint_building() {
        let cons = build_constraint(&var("x").lt(var("y") + 1.0)).unwrap();
        assert_eq!(cons.op(), Op::Lt);
        assert_eq!(
            cons.expr(),
            &LinearExpr::from_terms([("x", 1.0), ("y", -1.0)], -1.0)
        );
    }

    #[test]
    fn test_unsupported_comparison() {
        let cond = Cond::Compare {
            lhs: var("x"),
            op: CmpOp::In,
            rhs: var("y"),
        };
        assert_eq!(
            build_constraint(&cond),
            Err(AnalysisError::UnsupportedComparison { op: CmpOp::In })
        );
    }

    #[test]
    fn test_non_comparison_condition() {
        let cond = Cond::Not(Box::new(var("x").lt(1.0)));
        assert!(matches!(
            build_constraint(&cond),
            Err(AnalysisError::UnsupportedExpression { .. })
        ));
    }

    #[test]
    fn test_non_linear_comparison() {
        let cond = (var("x") * var("x")).le(4.0);
        assert!(matches!(
            build_constraint(&cond),
            Err(AnalysisError::NonLinearExpression { .. })
        ));
    }

    #[test]
    fn test_overflow() {
        // Folding finite literals may overflow; the offset stays infinite.
        let expr = build_expr(&(Expr::num(1e308) + 1e308)).unwrap();
        assert_eq!(expr.offset(), f64::INFINITY);

        let huge = var("x") * 1e308 * 10.0;
        assert_eq!(build_expr(&huge).unwrap().coeff("x"), f64::INFINITY);

        // Two overflows cancelling each other leave nothing to stand on.
        assert!(matches!(
            build_expr(&(huge.clone() - huge.clone())),
            Err(AnalysisError::UnsupportedExpression { .. })
        ));
        assert!(matches!(
            build_constraint(&huge.clone().lt(huge)),
            Err(AnalysisError::UnsupportedExpression { .. })
        ));
    }
}
