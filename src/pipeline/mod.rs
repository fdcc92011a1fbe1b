//! Pipeline module - parametric solving, strategy learning and evaluation

pub mod instance;
pub mod learner;
pub mod loader;
pub mod optimizer;
pub mod performance;
pub mod problem;
pub mod resolve;
pub mod select;
pub mod solver;
pub mod strategy;

/// Slack and violation tolerance: a row is binding and a point is feasible
/// at or below this value.
pub const TOL: f64 = 1e-5;

/// Cost and infeasibility recorded for a solve that produced no point.
pub const FAILURE_SENTINEL: f64 = 1e10;

pub use instance::{feature_matrix, Instance};
pub use learner::{CentroidLearner, KnnLearner, Learner, LearnerConfig, LearnerKind, Model};
pub use loader::{instances_from_frame, load_dataset, load_instances};
pub use optimizer::{
    load_training_data, save_training_data, Optimizer, TrainedOptimizer, TrainingData,
};
pub use performance::{
    accuracy, compare, performance, EvaluationContext, InstanceDetail, PerformanceSummary,
};
pub use problem::{
    Affine, ConstraintSense, ObjectiveSense, PopulatedProblem, ProblemTemplate, VariableSpec,
};
pub use resolve::{
    resolve_strategy, solve_parametric, solve_populated, solve_with_strategy, Execution,
    Resolution,
};
pub use select::{choose_best, pick_best, select_best};
pub use solver::{HighsSolver, SolveFailure, Solver, SolverConfig};
pub use strategy::{encode_strategies, Strategy, StrategyTable};
