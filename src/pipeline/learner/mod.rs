//! Strategy classifiers
//!
//! A learner maps feature vectors to a ranked list of strategy labels. The
//! pipeline only relies on the `Learner` trait; the concrete rankers are
//! selected through `LearnerKind` and stored as the serializable `Model`.

mod centroid;
mod knn;

use serde::{Deserialize, Serialize};

use crate::error::{OptimizerError, Result};

pub use centroid::CentroidLearner;
pub use knn::KnnLearner;

/// Ranking classifier over strategy labels
pub trait Learner: Send + Sync {
    /// Fit on one feature row and one label per training instance.
    /// Labels must lie in `0..n_classes`.
    fn train(&mut self, features: &[Vec<f64>], labels: &[usize], n_classes: usize) -> Result<()>;

    /// Up to `n_best` distinct labels per row, most promising first
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<usize>>>;

    /// Number of candidates proposed per instance
    fn n_best(&self) -> usize;

    /// Number of training rows seen by `train`
    fn n_train(&self) -> usize;

    /// Number of classes the learner ranks
    fn n_classes(&self) -> usize;
}

/// Available learner variants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearnerKind {
    /// Vote among the nearest training points
    #[default]
    NearestNeighbors,
    /// Distance to the per-class mean
    NearestCentroid,
}

impl std::fmt::Display for LearnerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LearnerKind::NearestNeighbors => write!(f, "knn"),
            LearnerKind::NearestCentroid => write!(f, "centroid"),
        }
    }
}

impl std::str::FromStr for LearnerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "knn" | "nearest-neighbors" | "neighbors" => Ok(LearnerKind::NearestNeighbors),
            "centroid" | "nearest-centroid" => Ok(LearnerKind::NearestCentroid),
            _ => Err(format!(
                "Unknown learner: '{}'. Use 'knn' or 'centroid'.",
                s
            )),
        }
    }
}

/// Learner configuration
#[derive(Debug, Clone)]
pub struct LearnerConfig {
    pub kind: LearnerKind,
    /// Candidates proposed per instance
    pub n_best: usize,
    /// Neighbourhood size for `NearestNeighbors`
    pub neighbors: usize,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            kind: LearnerKind::NearestNeighbors,
            n_best: 3,
            neighbors: 5,
        }
    }
}

/// Serializable learner selected by configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Model {
    NearestNeighbors(KnnLearner),
    NearestCentroid(CentroidLearner),
}

impl Model {
    pub fn from_config(config: &LearnerConfig) -> Self {
        match config.kind {
            LearnerKind::NearestNeighbors => {
                Model::NearestNeighbors(KnnLearner::new(config.n_best, config.neighbors))
            }
            LearnerKind::NearestCentroid => {
                Model::NearestCentroid(CentroidLearner::new(config.n_best))
            }
        }
    }

    pub fn kind(&self) -> LearnerKind {
        match self {
            Model::NearestNeighbors(_) => LearnerKind::NearestNeighbors,
            Model::NearestCentroid(_) => LearnerKind::NearestCentroid,
        }
    }

    fn inner(&self) -> &dyn Learner {
        match self {
            Model::NearestNeighbors(l) => l,
            Model::NearestCentroid(l) => l,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Learner {
        match self {
            Model::NearestNeighbors(l) => l,
            Model::NearestCentroid(l) => l,
        }
    }
}

impl Learner for Model {
    fn train(&mut self, features: &[Vec<f64>], labels: &[usize], n_classes: usize) -> Result<()> {
        self.inner_mut().train(features, labels, n_classes)
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<usize>>> {
        self.inner().predict(features)
    }

    fn n_best(&self) -> usize {
        self.inner().n_best()
    }

    fn n_train(&self) -> usize {
        self.inner().n_train()
    }

    fn n_classes(&self) -> usize {
        self.inner().n_classes()
    }
}

/// Per-feature standardization fitted on the training rows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Standardizer {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl Standardizer {
    pub(crate) fn fit(features: &[Vec<f64>]) -> Self {
        let n = features.len() as f64;
        let dim = features.first().map_or(0, |row| row.len());

        let mean: Vec<f64> = (0..dim)
            .map(|j| features.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        let scale = (0..dim)
            .map(|j| {
                let var = features
                    .iter()
                    .map(|row| (row[j] - mean[j]).powi(2))
                    .sum::<f64>()
                    / n;
                // constant features keep their raw offsets
                if var > 0.0 {
                    var.sqrt()
                } else {
                    1.0
                }
            })
            .collect();

        Self { mean, scale }
    }

    pub(crate) fn dim(&self) -> usize {
        self.mean.len()
    }

    pub(crate) fn apply(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }
}

pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Shared input checks for `Learner::train`
pub(crate) fn validate_training(
    features: &[Vec<f64>],
    labels: &[usize],
    n_classes: usize,
    n_best: usize,
) -> Result<()> {
    if n_best == 0 {
        return Err(OptimizerError::Learner("n_best must be at least 1".into()));
    }
    if features.is_empty() {
        return Err(OptimizerError::Learner("no training rows".into()));
    }
    if features.len() != labels.len() {
        return Err(OptimizerError::Learner(format!(
            "{} feature rows but {} labels",
            features.len(),
            labels.len()
        )));
    }
    let dim = features[0].len();
    if features.iter().any(|row| row.len() != dim) {
        return Err(OptimizerError::Learner(
            "feature rows have different lengths".into(),
        ));
    }
    if let Some(&label) = labels.iter().find(|&&l| l >= n_classes) {
        return Err(OptimizerError::Learner(format!(
            "label {} out of range for {} classes",
            label, n_classes
        )));
    }
    Ok(())
}

/// Shared input checks for `Learner::predict`
pub(crate) fn validate_prediction(features: &[Vec<f64>], dim: usize, n_train: usize) -> Result<()> {
    if n_train == 0 {
        return Err(OptimizerError::Learner("learner has not been trained".into()));
    }
    if let Some(row) = features.iter().find(|row| row.len() != dim) {
        return Err(OptimizerError::Learner(format!(
            "expected {} features, got {}",
            dim,
            row.len()
        )));
    }
    Ok(())
}
