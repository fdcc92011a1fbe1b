//! Best-of-k selection among candidate strategies

use crate::error::{OptimizerError, Result};

use super::problem::PopulatedProblem;
use super::resolve::{resolve_strategy, Resolution};
use super::solver::Solver;
use super::strategy::Strategy;
use super::TOL;

/// Index of the preferred candidate.
///
/// Feasible candidates (`infeasibility <= TOL`) win and the cheapest of them
/// is taken; when none is feasible the least infeasible one is taken. Ties go
/// to the lowest index. Returns `None` for an empty slice.
pub fn pick_best(candidates: &[Resolution]) -> Option<usize> {
    let lowest = |key: &dyn Fn(&Resolution) -> f64, feasible_only: bool| {
        candidates
            .iter()
            .enumerate()
            .filter(|(_, r)| !feasible_only || r.infeasibility <= TOL)
            .fold(None, |best: Option<(usize, f64)>, (i, r)| {
                let value = key(r);
                match best {
                    _ if value.is_nan() => best,
                    Some((_, current)) if value >= current => best,
                    _ => Some((i, value)),
                }
            })
            .map(|(i, _)| i)
    };

    lowest(&|r: &Resolution| r.cost, true)
        .or_else(|| lowest(&|r: &Resolution| r.infeasibility, false))
}

/// Keep the preferred resolution and charge it the time of all of them,
/// since each candidate had to be tried.
pub fn select_best(results: Vec<Resolution>) -> Result<Resolution> {
    let idx = pick_best(&results).ok_or(OptimizerError::NoCandidates)?;
    let total_time: f64 = results.iter().map(|r| r.time).sum();

    let mut best = results
        .into_iter()
        .nth(idx)
        .ok_or(OptimizerError::NoCandidates)?;
    best.time = total_time;
    Ok(best)
}

/// Resolve every candidate strategy and keep the best one
pub fn choose_best<S: Solver + ?Sized>(
    populated: &PopulatedProblem,
    candidates: &[&Strategy],
    solver: &S,
) -> Result<Resolution> {
    let results: Vec<Resolution> = candidates
        .iter()
        .map(|strategy| resolve_strategy(populated, strategy, solver))
        .collect();
    select_best(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(cost: f64, infeasibility: f64) -> Resolution {
        Resolution {
            x: Vec::new(),
            cost,
            time: 0.0,
            infeasibility,
            strategy: None,
        }
    }

    #[test]
    fn test_empty_has_no_pick() {
        assert_eq!(pick_best(&[]), None);
    }

    #[test]
    fn test_first_feasible_cost_tie() {
        let c = vec![candidate(2.0, 0.0), candidate(1.0, 0.0), candidate(1.0, 0.0)];
        assert_eq!(pick_best(&c), Some(1));
    }

    #[test]
    fn test_nan_cost_never_wins() {
        let c = vec![candidate(f64::NAN, 0.0), candidate(4.0, 0.0)];
        assert_eq!(pick_best(&c), Some(1));
    }
}
