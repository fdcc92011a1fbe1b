//! Parametric solve driver and strategy-constrained resolution
//!
//! Both paths populate the template for one instance, hand a `LinearModel`
//! to the solver, and record a `Resolution`. Solver failures are absorbed
//! into a failed resolution carrying the `FAILURE_SENTINEL`, so a batch
//! always yields one result per instance.

use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;

use crate::error::Result;
use crate::utils::{batch_progress, finish_batch, BatchStage};

use super::instance::Instance;
use super::problem::{PopulatedProblem, ProblemTemplate};
use super::solver::Solver;
use super::strategy::Strategy;
use super::{FAILURE_SENTINEL, TOL};

/// Outcome of a full or strategy-constrained solve
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    /// Primal solution (empty when the solve failed)
    pub x: Vec<f64>,
    pub cost: f64,
    /// Wall time in seconds
    pub time: f64,
    pub infeasibility: f64,
    /// Strategy found by a full solve, or the candidate used by a
    /// constrained solve. `None` when a full solve failed or returned an
    /// infeasible point.
    pub strategy: Option<Strategy>,
}

impl Resolution {
    /// Result recorded for a solve that produced no usable point
    pub fn failed(time: f64, strategy: Option<Strategy>) -> Self {
        Self {
            x: Vec::new(),
            cost: FAILURE_SENTINEL,
            time,
            infeasibility: FAILURE_SENTINEL,
            strategy,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.infeasibility <= TOL
    }
}

/// How a batch of independent instances is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    Sequential,
    /// Fixed rayon worker pool; `threads == 0` uses rayon's default size
    Parallel { threads: usize },
}

impl Default for Execution {
    fn default() -> Self {
        Execution::Parallel { threads: 0 }
    }
}

/// Run `task(i)` for every index in `0..len` and return the results in
/// index order, whatever the execution mode.
pub(crate) fn map_instances<T, F>(
    len: usize,
    execution: Execution,
    stage: BatchStage,
    task: F,
) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Sync + Send,
{
    let start = Instant::now();
    let pb = batch_progress(stage, len as u64);
    let run = |i: usize| {
        let out = task(i);
        pb.inc(1);
        out
    };

    let results: Vec<Result<T>> = match execution {
        Execution::Sequential => (0..len).map(run).collect(),
        Execution::Parallel { threads } => {
            let pool = ThreadPoolBuilder::new().num_threads(threads).build()?;
            // indexed collect keeps input order
            pool.install(|| (0..len).into_par_iter().map(run).collect())
        }
    };

    finish_batch(&pb, stage, start.elapsed());
    results.into_iter().collect()
}

/// Full mixed-integer solve of one populated problem
pub fn solve_populated<S: Solver + ?Sized>(populated: &PopulatedProblem, solver: &S) -> Resolution {
    let start = Instant::now();
    let outcome = solver.solve(&populated.full_model());
    let time = start.elapsed().as_secs_f64();

    match outcome {
        Ok(solution) => {
            let infeasibility = populated.infeasibility(&solution.x);
            // a point that violates the full problem does not define a strategy
            let strategy = if infeasibility <= TOL {
                Some(populated.extract_strategy(&solution.x))
            } else {
                warn!(
                    "Full solve returned a point with infeasibility {:.3e}, no strategy recorded",
                    infeasibility
                );
                None
            };
            Resolution {
                cost: populated.cost(&solution.x),
                infeasibility,
                x: solution.x,
                time,
                strategy,
            }
        }
        Err(failure) => {
            warn!("Full solve failed: {}", failure);
            Resolution::failed(time, None)
        }
    }
}

/// Solve every instance in full and extract its strategy.
///
/// Results align positionally with `instances`. Missing or mis-sized
/// parameters are configuration errors and abort the batch; solver failures
/// do not.
pub fn solve_parametric<S: Solver + ?Sized>(
    problem: &ProblemTemplate,
    instances: &[Instance],
    solver: &S,
    execution: Execution,
) -> Result<Vec<Resolution>> {
    info!(
        "Solving {} instance(s) of '{}' ({:?})",
        instances.len(),
        problem.name,
        execution
    );

    // Population errors surface before any solver call
    let populated: Vec<PopulatedProblem> = instances
        .iter()
        .map(|instance| problem.populate(instance))
        .collect::<Result<_>>()?;

    let results = map_instances(populated.len(), execution, BatchStage::FullSolve, |i| {
        let res = solve_populated(&populated[i], solver);
        debug!(
            "instance {}: cost={:.6} infeasibility={:.2e} time={:.4}s",
            i, res.cost, res.infeasibility, res.time
        );
        Ok(res)
    })?;

    let failed = results.iter().filter(|r| r.strategy.is_none()).count();
    if failed > 0 {
        warn!("{} of {} instance(s) failed to solve", failed, results.len());
    }

    Ok(results)
}

/// Resolve a populated problem with a fixed strategy.
///
/// The reduced continuous model is solved and its point verified against the
/// complete problem. A strategy that does not fit the problem or a reduced
/// model the solver rejects yields a failed resolution.
pub fn resolve_strategy<S: Solver + ?Sized>(
    populated: &PopulatedProblem,
    strategy: &Strategy,
    solver: &S,
) -> Resolution {
    let start = Instant::now();

    let Some(model) = populated.reduced_model(strategy) else {
        debug!("Strategy shape does not match the problem: {}", strategy);
        return Resolution::failed(start.elapsed().as_secs_f64(), Some(strategy.clone()));
    };
    debug_assert!(model.is_continuous());

    let outcome = solver.solve(&model);
    let time = start.elapsed().as_secs_f64();

    match outcome {
        Ok(solution) => Resolution {
            cost: populated.cost(&solution.x),
            infeasibility: populated.infeasibility(&solution.x),
            x: solution.x,
            time,
            strategy: Some(strategy.clone()),
        },
        Err(failure) => {
            debug!("Reduced solve failed ({}) for {}", failure, strategy);
            Resolution::failed(time, Some(strategy.clone()))
        }
    }
}

/// Populate one instance and resolve it with a fixed strategy
pub fn solve_with_strategy<S: Solver + ?Sized>(
    problem: &ProblemTemplate,
    instance: &Instance,
    strategy: &Strategy,
    solver: &S,
) -> Result<Resolution> {
    let populated = problem.populate(instance)?;
    Ok(resolve_strategy(&populated, strategy, solver))
}
