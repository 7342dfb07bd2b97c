/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use thiserror::Error;

use crate::ast::CmpOp;

/// Failures raised while building linear forms or analyzing a program.
///
/// None of these are recovered from locally: the analysis refuses a program
/// it cannot abstract soundly and there is no partial result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// A product of two symbolic sub-expressions.
    #[error("non-linear expression: {expr}")]
    NonLinearExpression { expr: String },

    #[error("unsupported expression: {expr}")]
    UnsupportedExpression { expr: String },

    #[error("unsupported comparison operator `{op}`")]
    UnsupportedComparison { op: CmpOp },

    #[error("variable `{name}` is not bound in the abstract state")]
    UnboundVariable { name: String },

    /// An assignment whose right-hand side is not linear.
    #[error("unsupported statement `{target} = ...`: {reason}")]
    UnsupportedStatement { target: String, reason: String },

    #[error("unsupported node: {kind}")]
    UnsupportedNode { kind: &'static str },

    /// The test of a conditional or loop is not linear.
    #[error("non-linear condition: {cond}")]
    NonLinearCondition { cond: String },

    #[error("invalid interval [{lo}, {hi}]")]
    InvalidInterval { lo: f64, hi: f64 },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
