//! Error types for the strategy learning pipeline.
//!
//! Configuration and structural failures are reported through
//! `OptimizerError` and always reach the caller. Per-instance numerical
//! failures never appear here: they are absorbed into a failed
//! `Resolution` by the solve driver.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the library.
#[derive(Debug, Error)]
pub enum OptimizerError {
    /// Training was requested on zero instances, so there are no classes.
    #[error("Training set is empty: at least one instance is required to learn strategies")]
    EmptyTrainingSet,

    /// An instance does not provide a parameter declared by the problem.
    #[error("Missing required parameter '{name}'")]
    MissingParameter { name: String },

    /// A parameter cell in a data table is null.
    #[error("Parameter '{name}' has a missing value in row {row}")]
    MissingValue { name: String, row: usize },

    /// A parameter has a different length than the problem declares.
    #[error("Parameter '{name}' has size {found}, expected {expected}")]
    ParameterSize {
        name: String,
        expected: usize,
        found: usize,
    },

    /// A parameter value is NaN or infinite.
    #[error("Parameter '{name}' has a non-finite value at position {index}")]
    NonFiniteParameter { name: String, index: usize },

    /// The problem template is malformed.
    #[error("Invalid problem template: {0}")]
    InvalidProblem(String),

    /// A label produced at inference time is not present in the strategy table.
    #[error("Unknown strategy label {label}: the strategy table has {len} entries")]
    UnknownLabel { label: usize, len: usize },

    /// Learner and strategy table disagree on the number of classes.
    #[error("Learner predicts {learner} classes but the strategy table has {table}")]
    ClassCountMismatch { learner: usize, table: usize },

    /// The selector was called without any candidate strategy.
    #[error("No candidate strategies to choose from")]
    NoCandidates,

    /// Performance evaluation was requested on zero instances.
    #[error("Evaluation set is empty: at least one instance is required")]
    EmptyEvaluationSet,

    /// Learner configuration or input is invalid.
    #[error("Learner error: {0}")]
    Learner(String),

    /// The artifact folder to load from does not exist.
    #[error("Artifact folder does not exist: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    /// The artifact folder to save into exists and overwriting is disabled.
    #[error("Artifact folder already exists: {} (enable overwrite to replace it)", .0.display())]
    ArtifactExists(PathBuf),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, OptimizerError>;
