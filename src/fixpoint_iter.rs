/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use log::debug;
use log::trace;

use crate::ast::Cond;
use crate::ast::Expr;
use crate::ast::Stmt;
use crate::builder;
use crate::datatype::NumericDomain;
use crate::error::AnalysisError;
use crate::error::Result;
use crate::linear::LinearConstraint;

pub const DEFAULT_WIDENING_DELAY: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Number of loop iterations that use plain join before widening kicks
    /// in.
    pub widening_delay: usize,
    /// Rounds of narrowing run after a loop invariant has stabilized. Zero
    /// disables the descending phase.
    pub narrowing_iterations: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            widening_delay: DEFAULT_WIDENING_DELAY,
            narrowing_iterations: 0,
        }
    }
}

impl AnalyzerConfig {
    pub fn with_widening_delay(mut self, widening_delay: usize) -> Self {
        self.widening_delay = widening_delay;
        self
    }

    pub fn with_narrowing_iterations(mut self, narrowing_iterations: usize) -> Self {
        self.narrowing_iterations = narrowing_iterations;
        self
    }
}

/// How one loop reached its fixpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Evaluations of the loop body during the ascending phase.
    pub iterations: usize,
    pub widened: bool,
    pub narrowing_rounds: usize,
}

/// Bookkeeping of a single analysis run. Loops are recorded in the order
/// they converge, so an inner loop appears once per analysis of its
/// enclosing body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixpointContext {
    loops: Vec<LoopStats>,
}

impl FixpointContext {
    pub fn loops(&self) -> &[LoopStats] {
        &self.loops
    }

    pub fn total_iterations(&self) -> usize {
        self.loops.iter().map(|stats| stats.iterations).sum()
    }

    fn record_loop(&mut self, stats: LoopStats) {
        self.loops.push(stats);
    }
}

#[derive(Debug, Clone)]
pub struct Analysis<D> {
    pub state: D,
    pub context: FixpointContext,
}

impl<D> Analysis<D> {
    pub fn into_state(self) -> D {
        self.state
    }
}

/*
 * Abstract execution of a statement tree over any numeric domain.
 *
 * The current abstract state is an accumulator: each statement consumes the
 * state flowing into it and returns the state flowing out. Branches and
 * loops work on explicit copies, so no state is ever shared between two
 * paths.
 *
 * Loops are solved by ascending iteration: join for the first
 * `widening_delay` rounds, widening afterwards. There is no iteration cap;
 * termination rests on the widening guarantee of the domain.
 */
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn execute<D: NumericDomain>(&self, program: &[Stmt], initial: D) -> Result<Analysis<D>> {
        debug!("Analyzing {} statement(s) from {}", program.len(), initial);
        let mut context = FixpointContext::default();
        let state = self.analyze_block(program, initial, &mut context)?;
        debug!(
            "Analysis finished after {} loop iteration(s): {}",
            context.total_iterations(),
            state
        );
        Ok(Analysis { state, context })
    }

    fn analyze_block<D: NumericDomain>(
        &self,
        stmts: &[Stmt],
        state: D,
        context: &mut FixpointContext,
    ) -> Result<D> {
        stmts.iter().try_fold(state, |state, stmt| {
            self.analyze_statement(stmt, state, context)
        })
    }

    fn analyze_statement<D: NumericDomain>(
        &self,
        stmt: &Stmt,
        state: D,
        context: &mut FixpointContext,
    ) -> Result<D> {
        trace!("{} <- {}", stmt.kind(), state);
        match stmt {
            Stmt::Assign { target, value } => Self::analyze_assign(target, value, state),
            Stmt::If { test, body, orelse } => self.analyze_if(test, body, orelse, state, context),
            Stmt::While { test, body } => self.analyze_while(test, body, state, context),
            Stmt::Block(stmts) => self.analyze_block(stmts, state, context),
            Stmt::Return(_) | Stmt::Break | Stmt::Continue | Stmt::Expr(_) => {
                Err(AnalysisError::UnsupportedNode { kind: stmt.kind() })
            }
        }
    }

    fn analyze_assign<D: NumericDomain>(target: &str, value: &Expr, mut state: D) -> Result<D> {
        let expr = builder::build_expr(value).map_err(|err| match err {
            AnalysisError::NonLinearExpression { .. } => AnalysisError::UnsupportedStatement {
                target: target.to_owned(),
                reason: err.to_string(),
            },
            err => err,
        })?;
        state.assign(target, &expr)?;
        Ok(state)
    }

    fn analyze_if<D: NumericDomain>(
        &self,
        test: &Cond,
        body: &[Stmt],
        orelse: &[Stmt],
        state: D,
        context: &mut FixpointContext,
    ) -> Result<D> {
        let condition = Self::build_condition(test)?;

        let mut then_state = state.copy_state();
        let mut else_state = state;

        then_state.meet_constraint(&condition)?;
        let then_state = self.analyze_block(body, then_state, context)?;

        else_state.meet_constraint(&condition.negate())?;
        let else_state = self.analyze_block(orelse, else_state, context)?;

        Ok(then_state.join_states(else_state))
    }

    fn analyze_while<D: NumericDomain>(
        &self,
        test: &Cond,
        body: &[Stmt],
        entry: D,
        context: &mut FixpointContext,
    ) -> Result<D> {
        let condition = Self::build_condition(test)?;
        let mut stats = LoopStats::default();

        let mut invariant = entry.copy_state();
        let mut current = entry.copy_state();
        let mut iteration = 0;
        loop {
            current.meet_constraint(&condition)?;
            let post_body = self.analyze_block(body, current, context)?;
            let mut next = invariant.copy_state().join_states(post_body);
            if iteration >= self.config.widening_delay {
                next = invariant.copy_state().widen_states(next);
                stats.widened = true;
            }
            stats.iterations += 1;

            if invariant.equal_states(&next) {
                break;
            }
            trace!("while {}: iteration {} -> {}", test, iteration, next);
            invariant = next.copy_state();
            current = next;
            iteration += 1;
        }

        for _ in 0..self.config.narrowing_iterations {
            let mut body_entry = invariant.copy_state();
            body_entry.meet_constraint(&condition)?;
            let post_body = self.analyze_block(body, body_entry, context)?;
            let refined = invariant
                .copy_state()
                .narrow_states(entry.copy_state().join_states(post_body));
            stats.narrowing_rounds += 1;
            if refined.equal_states(&invariant) {
                break;
            }
            invariant = refined;
        }

        debug!(
            "while {}: converged after {} iteration(s) (widened: {}, narrowing rounds: {}) to {}",
            test, stats.iterations, stats.widened, stats.narrowing_rounds, invariant
        );
        context.record_loop(stats);

        let mut exit = invariant;
        exit.meet_constraint(&condition.negate())?;
        Ok(exit)
    }

    fn build_condition(test: &Cond) -> Result<LinearConstraint> {
        builder::build_constraint(test).map_err(|err| match err {
            AnalysisError::NonLinearExpression { .. } => AnalysisError::NonLinearCondition {
                cond: test.to_string(),
            },
            err => err,
        })
    }
}
