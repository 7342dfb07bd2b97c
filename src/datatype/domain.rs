/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt;

use crate::error::Result;
use crate::linear::LinearConstraint;
use crate::linear::LinearExpr;

/*
 * The lattice structure shared by all abstract states.
 *
 * `leq` is the partial order (s1 ⊑ s2 when s1 describes fewer concrete
 * states), `join` the least upper bound and `meet` the greatest lower bound.
 * `widen` must satisfy s2 ⊑ widen(s1, s2) and must turn every ascending
 * chain s0, widen(s0, s1), widen(widen(s0, s1), s2), ... into a chain that
 * becomes stationary after finitely many steps. `narrow` refines a
 * post-fixpoint without going below it.
 *
 * Implementors provide the in-place `*_with` operations; the by-value forms
 * used by the analyzer are derived from them.
 */
pub trait AbstractDomain: Clone + Eq {
    fn bottom() -> Self;
    fn top() -> Self;
    fn is_bottom(&self) -> bool;
    fn is_top(&self) -> bool;
    fn leq(&self, rhs: &Self) -> bool;

    fn join_with(&mut self, rhs: Self);
    fn meet_with(&mut self, rhs: Self);
    fn widen_with(&mut self, rhs: Self);
    fn narrow_with(&mut self, rhs: Self);

    #[must_use]
    fn join(mut self, rhs: Self) -> Self {
        self.join_with(rhs);
        self
    }

    #[must_use]
    fn meet(mut self, rhs: Self) -> Self {
        self.meet_with(rhs);
        self
    }

    #[must_use]
    fn widen(mut self, rhs: Self) -> Self {
        self.widen_with(rhs);
        self
    }

    #[must_use]
    fn narrow(mut self, rhs: Self) -> Self {
        self.narrow_with(rhs);
        self
    }
}

/*
 * The contract between the fixpoint engine and a numeric abstract domain.
 *
 * A state tracks a set of program variables that grows as the analysis
 * proceeds: a variable enters on its first assignment. Two states reaching
 * the same merge point along different paths can therefore track different
 * variables. Before any binary operation (join, widening, narrowing,
 * equality) both operands go through `unify`, after which a variable missing
 * from one side is present there as unconstrained. The provided `*_states`
 * methods perform that step; the engine only ever calls those.
 */
pub trait NumericDomain: AbstractDomain + fmt::Display + fmt::Debug {
    /// Initial constraint of one variable, e.g. a range.
    type Seed;

    /// A state tracking exactly the seeded variables. No seeds yields the
    /// top state with an empty environment.
    fn init_state<S, I>(seeds: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Self::Seed)>;

    /// Strongest postcondition of `var = expr`. Adds `var` if it is new.
    fn assign(&mut self, var: &str, expr: &LinearExpr) -> Result<()>;

    /// Restricts the state to the concrete states satisfying `constraint`.
    /// Variables the state does not track are unconstrained beforehand.
    fn meet_constraint(&mut self, constraint: &LinearConstraint) -> Result<()>;

    /// Makes both states track the union of their variables.
    fn unify(&mut self, other: &mut Self);

    /// Tracked variables, sorted by name.
    fn variables(&self) -> Vec<String>;

    fn join_states(mut self, mut other: Self) -> Self {
        self.unify(&mut other);
        self.join(other)
    }

    fn widen_states(mut self, mut other: Self) -> Self {
        self.unify(&mut other);
        self.widen(other)
    }

    fn narrow_states(mut self, mut other: Self) -> Self {
        self.unify(&mut other);
        self.narrow(other)
    }

    /// Fixpoint convergence test; agrees with `leq` in both directions.
    fn equal_states(&self, other: &Self) -> bool {
        let mut lhs = self.clone();
        let mut rhs = other.clone();
        lhs.unify(&mut rhs);
        lhs == rhs
    }

    fn copy_state(&self) -> Self {
        self.clone()
    }
}
