/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

#![allow(dead_code)]

use lin_absint::ast::Expr;
use lin_absint::ast::Stmt;
use lin_absint::datatype::IntervalEnvironment;

pub const INF: f64 = f64::INFINITY;

pub fn var(name: &str) -> Expr {
    Expr::var(name)
}

pub fn num(value: f64) -> Expr {
    Expr::num(value)
}

pub fn intervals<const N: usize>(bounds: [(&str, (f64, f64)); N]) -> IntervalEnvironment {
    IntervalEnvironment::from_bounds(bounds).expect("valid bounds")
}

/// x, y in [0, 5].
pub fn xy_env() -> IntervalEnvironment {
    intervals([("x", (0.0, 5.0)), ("y", (0.0, 5.0))])
}

/**
 *  a = x + y;
 *  b = x - y;
 *  c = a + b;
 */
pub fn straight_line() -> Vec<Stmt> {
    vec![
        Stmt::assign("a", var("x") + var("y")),
        Stmt::assign("b", var("x") - var("y")),
        Stmt::assign("c", var("a") + var("b")),
    ]
}

/**
 *  <straight_line>
 *  if (c < -6) {
 *    d = 1;
 *  } else {
 *    d = 2;
 *  }
 */
pub fn branch_on_c() -> Vec<Stmt> {
    let mut program = straight_line();
    program.push(Stmt::if_else(
        var("c").lt(-6.0),
        vec![Stmt::assign("d", 1.0)],
        vec![Stmt::assign("d", 2.0)],
    ));
    program
}

/**
 *  while (x < 100) {
 *    x = x + 1;
 *  }
 */
pub fn count_to_hundred() -> Vec<Stmt> {
    vec![Stmt::while_loop(
        var("x").lt(100.0),
        vec![Stmt::assign("x", var("x") + 1.0)],
    )]
}

/**
 *  i = 0;
 *  while (i < 10) {
 *    j = 0;
 *    while (j < i) {
 *      j = j + 1;
 *    }
 *    i = i + 1;
 *  }
 */
pub fn nested_loops() -> Vec<Stmt> {
    vec![
        Stmt::assign("i", 0.0),
        Stmt::while_loop(
            var("i").lt(10.0),
            vec![
                Stmt::assign("j", 0.0),
                Stmt::while_loop(
                    var("j").lt(var("i")),
                    vec![Stmt::assign("j", var("j") + 1.0)],
                ),
                Stmt::assign("i", var("i") + 1.0),
            ],
        ),
    ]
}
