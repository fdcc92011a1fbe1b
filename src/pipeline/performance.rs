//! Evaluation of a trained optimizer against full solves

use log::info;
use polars::prelude::*;
use serde::Serialize;

use crate::error::{OptimizerError, Result};

use super::instance::Instance;
use super::learner::Learner;
use super::optimizer::TrainedOptimizer;
use super::resolve::{solve_parametric, Execution, Resolution};
use super::solver::Solver;
use super::strategy::Strategy;
use super::TOL;

/// Offset in the suboptimality denominator
const SUBOPT_EPS: f64 = 1e-10;

/// Fraction of positions whose predicted strategy equals the true one, and
/// the per-position match flags. A missing strategy never matches.
pub fn accuracy(predicted: &[Option<Strategy>], truth: &[Option<Strategy>]) -> (f64, Vec<bool>) {
    let correct: Vec<bool> = predicted
        .iter()
        .zip(truth)
        .map(|(p, t)| matches!((p, t), (Some(p), Some(t)) if p == t))
        .collect();

    if correct.is_empty() {
        return (0.0, correct);
    }
    let n_correct = correct.iter().filter(|&&c| c).count();
    (n_correct as f64 / correct.len() as f64, correct)
}

/// Static facts about the evaluated optimizer reported with every summary
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationContext {
    pub problem: String,
    pub n_best: usize,
    pub num_var: usize,
    pub num_constr: usize,
    pub n_train: usize,
    pub n_theta: usize,
    pub n_strategies: usize,
}

impl EvaluationContext {
    pub fn of<L: Learner>(trained: &TrainedOptimizer<L>) -> Self {
        Self {
            problem: trained.name().to_string(),
            n_best: trained.learner().n_best(),
            num_var: trained.problem().num_var(),
            num_constr: trained.problem().num_constraints(),
            n_train: trained.learner().n_train(),
            n_theta: trained.problem().n_features(),
            n_strategies: trained.table().len(),
        }
    }
}

/// Aggregate statistics of one evaluation run
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub problem: String,
    pub n_best: usize,
    pub num_var: usize,
    pub num_constr: usize,
    pub n_test: usize,
    pub n_train: usize,
    pub n_theta: usize,
    pub n_correct: usize,
    pub n_strategies: usize,
    pub accuracy: f64,
    /// Predictions with infeasibility at or above `TOL`
    pub n_infeas: usize,
    pub avg_infeas: f64,
    /// Mean over feasible predictions; `None` when there are none
    pub avg_subopt: Option<f64>,
    pub max_infeas: f64,
    pub max_subopt: f64,
    pub avg_time_improv: f64,
    pub max_time_improv: f64,
}

/// Per-instance comparison
#[derive(Debug, Clone, Serialize)]
pub struct InstanceDetail {
    pub problem: String,
    pub correct: bool,
    pub infeas: f64,
    pub subopt: f64,
    pub time_improvement: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn max(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, f64::max)
}

/// Compare predicted resolutions against the true ones, position by position
pub fn compare(
    context: &EvaluationContext,
    truth: &[Resolution],
    predicted: &[Resolution],
) -> (PerformanceSummary, Vec<InstanceDetail>) {
    let true_strategies: Vec<Option<Strategy>> =
        truth.iter().map(|r| r.strategy.clone()).collect();
    let pred_strategies: Vec<Option<Strategy>> =
        predicted.iter().map(|r| r.strategy.clone()).collect();
    let (acc, correct) = accuracy(&pred_strategies, &true_strategies);

    let details: Vec<InstanceDetail> = truth
        .iter()
        .zip(predicted)
        .zip(&correct)
        .map(|((t, p), &correct)| InstanceDetail {
            problem: context.problem.clone(),
            correct,
            infeas: p.infeasibility,
            subopt: (p.cost - t.cost) / (t.cost + SUBOPT_EPS),
            time_improvement: 1.0 - p.time / t.time,
        })
        .collect();

    let summary = PerformanceSummary {
        problem: context.problem.clone(),
        n_best: context.n_best,
        num_var: context.num_var,
        num_constr: context.num_constr,
        n_test: details.len(),
        n_train: context.n_train,
        n_theta: context.n_theta,
        n_correct: correct.iter().filter(|&&c| c).count(),
        n_strategies: context.n_strategies,
        accuracy: acc,
        n_infeas: details.iter().filter(|d| d.infeas >= TOL).count(),
        avg_infeas: mean(details.iter().map(|d| d.infeas)).unwrap_or(0.0),
        avg_subopt: mean(
            details
                .iter()
                .filter(|d| d.infeas <= TOL)
                .map(|d| d.subopt),
        ),
        max_infeas: max(details.iter().map(|d| d.infeas)),
        max_subopt: max(details.iter().map(|d| d.subopt)),
        avg_time_improv: mean(details.iter().map(|d| d.time_improvement)).unwrap_or(0.0),
        max_time_improv: max(details.iter().map(|d| d.time_improvement)),
    };

    (summary, details)
}

/// Solve `instances` in full and with the trained optimizer, then compare
pub fn performance<L: Learner, S: Solver + ?Sized>(
    trained: &TrainedOptimizer<L>,
    instances: &[Instance],
    solver: &S,
    execution: Execution,
) -> Result<(PerformanceSummary, Vec<InstanceDetail>)> {
    if instances.is_empty() {
        return Err(OptimizerError::EmptyEvaluationSet);
    }

    info!("Performance evaluation on {} instance(s)", instances.len());
    let truth = solve_parametric(trained.problem(), instances, solver, execution)?;
    let predicted = trained.solve(instances, solver, execution)?;

    let (summary, details) = compare(&EvaluationContext::of(trained), &truth, &predicted);
    info!(
        "Accuracy {:.2}%, {} infeasible prediction(s)",
        summary.accuracy * 100.0,
        summary.n_infeas
    );
    Ok((summary, details))
}

impl PerformanceSummary {
    /// Single-row table of the summary
    pub fn to_frame(&self) -> Result<DataFrame> {
        let df = df! {
            "problem" => [self.problem.as_str()],
            "n_best" => [self.n_best as u64],
            "num_var" => [self.num_var as u64],
            "num_constr" => [self.num_constr as u64],
            "n_test" => [self.n_test as u64],
            "n_train" => [self.n_train as u64],
            "n_theta" => [self.n_theta as u64],
            "n_correct" => [self.n_correct as u64],
            "n_strategies" => [self.n_strategies as u64],
            "accuracy" => [self.accuracy],
            "n_infeas" => [self.n_infeas as u64],
            "avg_infeas" => [self.avg_infeas],
            "avg_subopt" => [self.avg_subopt],
            "max_infeas" => [self.max_infeas],
            "max_subopt" => [self.max_subopt],
            "avg_time_improv" => [self.avg_time_improv],
            "max_time_improv" => [self.max_time_improv],
        }?;
        Ok(df)
    }
}

impl InstanceDetail {
    /// One row per instance
    pub fn to_frame(details: &[InstanceDetail]) -> Result<DataFrame> {
        let df = df! {
            "problem" => details.iter().map(|d| d.problem.as_str()).collect::<Vec<_>>(),
            "correct" => details.iter().map(|d| d.correct).collect::<Vec<_>>(),
            "infeas" => details.iter().map(|d| d.infeas).collect::<Vec<_>>(),
            "subopt" => details.iter().map(|d| d.subopt).collect::<Vec<_>>(),
            "time_improvement" => details.iter().map(|d| d.time_improvement).collect::<Vec<_>>(),
        }?;
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolution(cost: f64, time: f64, infeasibility: f64, binding: bool) -> Resolution {
        Resolution {
            x: vec![0.0],
            cost,
            time,
            infeasibility,
            strategy: Some(Strategy::new(vec![binding], vec![])),
        }
    }

    fn context() -> EvaluationContext {
        EvaluationContext {
            problem: "toy".to_string(),
            n_best: 2,
            num_var: 1,
            num_constr: 1,
            n_train: 10,
            n_theta: 1,
            n_strategies: 2,
        }
    }

    #[test]
    fn test_accuracy_none_never_matches() {
        let s = Some(Strategy::new(vec![true], vec![]));
        let (acc, idx) = accuracy(&[s.clone(), None], &[s, None]);
        assert_eq!(idx, vec![true, false]);
        assert!((acc - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_compare_statistics() {
        let truth = vec![resolution(10.0, 2.0, 0.0, true), resolution(4.0, 1.0, 0.0, false)];
        let predicted = vec![
            resolution(11.0, 1.0, 0.0, true),
            resolution(4.0, 0.5, 0.5, true),
        ];

        let (summary, details) = compare(&context(), &truth, &predicted);
        assert_eq!(summary.n_test, 2);
        assert_eq!(summary.n_correct, 1);
        assert_eq!(summary.n_infeas, 1);
        assert!((summary.accuracy - 0.5).abs() < 1e-12);
        assert!((summary.avg_infeas - 0.25).abs() < 1e-12);
        // only the feasible prediction counts towards the average
        assert!((summary.avg_subopt.unwrap() - 0.1).abs() < 1e-6);
        assert!((summary.max_subopt - 0.1).abs() < 1e-6);
        assert!((summary.avg_time_improv - 0.5).abs() < 1e-12);
        assert!(details[0].correct && !details[1].correct);
    }

    #[test]
    fn test_no_feasible_prediction_has_no_average_subopt() {
        let truth = vec![resolution(1.0, 1.0, 0.0, true)];
        let predicted = vec![resolution(2.0, 1.0, 1.0, true)];
        let (summary, _) = compare(&context(), &truth, &predicted);
        assert_eq!(summary.avg_subopt, None);
    }

    #[test]
    fn test_frames_have_one_row_per_record() {
        let truth = vec![resolution(1.0, 1.0, 0.0, true); 3];
        let (summary, details) = compare(&context(), &truth, &truth);
        assert_eq!(summary.to_frame().unwrap().shape(), (1, 17));
        assert_eq!(InstanceDetail::to_frame(&details).unwrap().shape(), (3, 5));
    }
}
