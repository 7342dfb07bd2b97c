/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Range inference for small imperative programs by abstract interpretation.
//!
//! A program tree ([`ast`]) is translated statement by statement into linear
//! forms ([`linear`], via [`builder`]) and executed over a numeric abstract
//! domain ([`datatype::NumericDomain`]). The reference domain is
//! [`datatype::IntervalEnvironment`]; loops are solved by widening in
//! [`fixpoint_iter::Analyzer`].
//!
//! ```
//! use lin_absint::ast::Expr;
//! use lin_absint::ast::Stmt;
//! use lin_absint::datatype::IntervalEnvironment;
//! use lin_absint::fixpoint_iter::Analyzer;
//!
//! let program = vec![Stmt::while_loop(
//!     Expr::var("x").lt(100.0),
//!     vec![Stmt::assign("x", Expr::var("x") + 1.0)],
//! )];
//! let initial = IntervalEnvironment::from_bounds([("x", (0.0, 5.0))]).unwrap();
//! let result = Analyzer::default().execute(&program, initial).unwrap();
//! assert_eq!(result.state.bounds("x"), Some((100.0, f64::INFINITY)));
//! ```

pub mod ast;
pub mod builder;
pub mod datatype;
pub mod error;
pub mod fixpoint_iter;
pub mod linear;

pub use error::AnalysisError;
pub use error::Result;
