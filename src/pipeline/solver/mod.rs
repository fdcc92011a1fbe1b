//! Solver interface for parametric re-solves
//!
//! The pipeline talks to solvers through the `Solver` trait. A `LinearModel`
//! borrows the rows of a `PopulatedProblem`, so the full mixed-integer solve
//! and the strategy-constrained continuous solve share the same numbers.
//! `HighsSolver` is the default backend (HiGHS via good_lp).

mod highs;

use thiserror::Error;

use super::problem::{ObjectiveSense, Row};

pub use highs::HighsSolver;

/// Configuration for the solver backend
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Maximum time allowed for one solve (seconds)
    pub timeout_seconds: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30.0,
        }
    }
}

/// Bounds and integrality of one model variable
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModelVariable {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub integer: bool,
}

/// Solver-facing linear model: `min/max c.x` subject to `inequalities`
/// (`a.x <= rhs`), `equalities` (`a.x == rhs`) and variable bounds.
#[derive(Debug, Clone)]
pub struct LinearModel<'a> {
    pub sense: ObjectiveSense,
    pub cost: &'a [f64],
    pub inequalities: Vec<&'a Row>,
    pub equalities: Vec<&'a Row>,
    pub variables: Vec<ModelVariable>,
}

impl LinearModel<'_> {
    pub fn is_continuous(&self) -> bool {
        self.variables.iter().all(|v| !v.integer)
    }
}

/// Primal values returned by a successful solve
#[derive(Debug, Clone)]
pub struct RawSolution {
    pub x: Vec<f64>,
    /// Objective value without the constant term
    pub objective: f64,
}

/// Reasons a single solve produced no usable point
#[derive(Debug, Clone, Error)]
pub enum SolveFailure {
    #[error("problem is infeasible")]
    Infeasible,
    #[error("problem is unbounded")]
    Unbounded,
    /// Stopped on the time limit before proving optimality
    #[error("time limit reached before optimality")]
    TimeLimit,
    #[error("solver error: {0}")]
    Solver(String),
}

/// A backend able to solve many bindings of the same symbolic structure.
///
/// Implementations must be usable from several worker threads at once; each
/// call receives its own model.
pub trait Solver: Send + Sync {
    fn solve(&self, model: &LinearModel<'_>) -> Result<RawSolution, SolveFailure>;
}
