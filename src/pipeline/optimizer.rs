//! Learned optimizer: training, inference and persistence
//!
//! `Optimizer` holds a validated problem template. Training solves every
//! instance in full, encodes the resulting strategies and fits a learner;
//! the outcome is an immutable `TrainedOptimizer` that answers new
//! instances by resolving the learner's top candidates.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{OptimizerError, Result};
use crate::utils::BatchStage;

use super::instance::{feature_matrix, Instance};
use super::learner::Learner;
use super::performance::{self, InstanceDetail, PerformanceSummary};
use super::problem::{PopulatedProblem, ProblemTemplate};
use super::resolve::{map_instances, solve_parametric, Execution, Resolution};
use super::select::choose_best;
use super::solver::Solver;
use super::strategy::{encode_strategies, Strategy, StrategyTable};

const OPTIMIZER_FILE: &str = "optimizer.json";
const LEARNER_FILE: &str = "learner.json";

/// Encoded training set: instances with their strategy labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingData {
    pub instances: Vec<Instance>,
    pub labels: Vec<usize>,
    pub table: StrategyTable,
}

/// Save encoded training data as JSON
pub fn save_training_data(data: &TrainingData, path: &Path) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, data)?;
    info!(
        "Saved {} training instance(s) to {}",
        data.instances.len(),
        path.display()
    );
    Ok(())
}

/// Load encoded training data written by `save_training_data`
pub fn load_training_data(path: &Path) -> Result<TrainingData> {
    if !path.exists() {
        return Err(OptimizerError::ArtifactNotFound(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Untrained optimizer for one problem template
#[derive(Debug, Clone)]
pub struct Optimizer {
    problem: ProblemTemplate,
}

impl Optimizer {
    pub fn new(problem: ProblemTemplate) -> Result<Self> {
        problem.validate()?;
        Ok(Self { problem })
    }

    pub fn problem(&self) -> &ProblemTemplate {
        &self.problem
    }

    /// Solve every instance in full and encode the strategies.
    ///
    /// Instances whose full solve failed have no strategy and are left out
    /// of the training data.
    pub fn encode_training_set<S: Solver + ?Sized>(
        &self,
        instances: &[Instance],
        solver: &S,
        execution: Execution,
    ) -> Result<TrainingData> {
        let results = solve_parametric(&self.problem, instances, solver, execution)?;

        let mut kept = Vec::with_capacity(instances.len());
        let mut strategies = Vec::with_capacity(instances.len());
        for (instance, result) in instances.iter().zip(results) {
            if let Some(strategy) = result.strategy {
                kept.push(instance.clone());
                strategies.push(strategy);
            }
        }
        let dropped = instances.len() - kept.len();
        if dropped > 0 {
            warn!(
                "Dropping {} training instance(s) without a strategy",
                dropped
            );
        }

        let (labels, table) = encode_strategies(&strategies);
        info!(
            "Encoded {} instance(s) into {} distinct strateg{}",
            labels.len(),
            table.len(),
            if table.len() == 1 { "y" } else { "ies" }
        );

        Ok(TrainingData {
            instances: kept,
            labels,
            table,
        })
    }

    /// Fit a learner on already encoded training data
    pub fn train_with_data<L: Learner>(
        &self,
        data: &TrainingData,
        mut learner: L,
    ) -> Result<TrainedOptimizer<L>> {
        if data.labels.is_empty() || data.table.is_empty() {
            return Err(OptimizerError::EmptyTrainingSet);
        }

        let features = feature_matrix(&self.problem, &data.instances)?;
        learner.train(&features, &data.labels, data.table.len())?;

        if learner.n_classes() != data.table.len() {
            return Err(OptimizerError::ClassCountMismatch {
                learner: learner.n_classes(),
                table: data.table.len(),
            });
        }

        info!(
            "Trained learner on {} instance(s), {} feature(s), n_best = {}",
            learner.n_train(),
            self.problem.n_features(),
            learner.n_best()
        );

        Ok(TrainedOptimizer {
            name: self.problem.name.clone(),
            problem: self.problem.clone(),
            table: data.table.clone(),
            learner,
        })
    }

    /// Solve the training instances, encode their strategies and fit the learner
    pub fn train<L: Learner, S: Solver + ?Sized>(
        &self,
        instances: &[Instance],
        learner: L,
        solver: &S,
        execution: Execution,
    ) -> Result<TrainedOptimizer<L>> {
        if instances.is_empty() {
            return Err(OptimizerError::EmptyTrainingSet);
        }
        let data = self.encode_training_set(instances, solver, execution)?;
        self.train_with_data(&data, learner)
    }
}

#[derive(Serialize)]
struct OptimizerFileRef<'a> {
    version: &'a str,
    name: &'a str,
    problem: &'a ProblemTemplate,
    table: &'a StrategyTable,
}

#[derive(Deserialize)]
struct OptimizerFile {
    name: String,
    problem: ProblemTemplate,
    table: StrategyTable,
}

/// Trained artifacts: problem, strategy table and learner
#[derive(Debug, Clone)]
pub struct TrainedOptimizer<L> {
    name: String,
    problem: ProblemTemplate,
    table: StrategyTable,
    learner: L,
}

impl<L: Learner> TrainedOptimizer<L> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn problem(&self) -> &ProblemTemplate {
        &self.problem
    }

    pub fn table(&self) -> &StrategyTable {
        &self.table
    }

    pub fn learner(&self) -> &L {
        &self.learner
    }

    /// Candidate strategies for each instance, best ranked first
    pub fn candidates(&self, instances: &[Instance]) -> Result<Vec<Vec<&Strategy>>> {
        let features = feature_matrix(&self.problem, instances)?;
        let ranked = self.learner.predict(&features)?;
        ranked
            .iter()
            .map(|labels| {
                labels
                    .iter()
                    .map(|&l| self.table.decode(l))
                    .collect::<Result<Vec<_>>>()
            })
            .collect()
    }

    /// Predict a solution for every instance, in input order
    pub fn solve<S: Solver + ?Sized>(
        &self,
        instances: &[Instance],
        solver: &S,
        execution: Execution,
    ) -> Result<Vec<Resolution>> {
        info!(
            "Solving {} instance(s) of '{}' with learned strategies",
            instances.len(),
            self.name
        );

        let candidates = self.candidates(instances)?;
        let populated: Vec<PopulatedProblem> = instances
            .iter()
            .map(|instance| self.problem.populate(instance))
            .collect::<Result<_>>()?;

        map_instances(populated.len(), execution, BatchStage::CandidateSolve, |i| {
            choose_best(&populated[i], &candidates[i], solver)
        })
    }

    /// Compare predicted solutions against full solves
    pub fn performance<S: Solver + ?Sized>(
        &self,
        instances: &[Instance],
        solver: &S,
        execution: Execution,
    ) -> Result<(PerformanceSummary, Vec<InstanceDetail>)> {
        performance::performance(self, instances, solver, execution)
    }
}

impl<L: Learner + Serialize> TrainedOptimizer<L> {
    /// Write `optimizer.json` and `learner.json` into `folder`.
    ///
    /// An existing folder is replaced only when `overwrite` is set.
    pub fn save(&self, folder: &Path, overwrite: bool) -> Result<()> {
        if folder.exists() {
            if !overwrite {
                return Err(OptimizerError::ArtifactExists(folder.to_path_buf()));
            }
            fs::remove_dir_all(folder)?;
        }
        fs::create_dir_all(folder)?;

        let header = OptimizerFileRef {
            version: env!("CARGO_PKG_VERSION"),
            name: &self.name,
            problem: &self.problem,
            table: &self.table,
        };
        let writer = BufWriter::new(File::create(folder.join(OPTIMIZER_FILE))?);
        serde_json::to_writer_pretty(writer, &header)?;

        let writer = BufWriter::new(File::create(folder.join(LEARNER_FILE))?);
        serde_json::to_writer(writer, &self.learner)?;

        info!("Saved optimizer '{}' to {}", self.name, folder.display());
        Ok(())
    }
}

impl<L: Learner + DeserializeOwned> TrainedOptimizer<L> {
    /// Read artifacts written by `save`
    pub fn load(folder: &Path) -> Result<Self> {
        if !folder.is_dir() {
            return Err(OptimizerError::ArtifactNotFound(folder.to_path_buf()));
        }

        let optimizer_path = folder.join(OPTIMIZER_FILE);
        let learner_path = folder.join(LEARNER_FILE);
        for path in [&optimizer_path, &learner_path] {
            if !path.exists() {
                return Err(OptimizerError::ArtifactNotFound(path.clone()));
            }
        }

        let header: OptimizerFile =
            serde_json::from_reader(BufReader::new(File::open(&optimizer_path)?))?;
        let learner: L = serde_json::from_reader(BufReader::new(File::open(&learner_path)?))?;

        header.problem.validate()?;
        if learner.n_classes() != header.table.len() {
            return Err(OptimizerError::ClassCountMismatch {
                learner: learner.n_classes(),
                table: header.table.len(),
            });
        }

        info!(
            "Loaded optimizer '{}' ({} strategies) from {}",
            header.name,
            header.table.len(),
            folder.display()
        );

        Ok(Self {
            name: header.name,
            problem: header.problem,
            table: header.table,
            learner,
        })
    }
}
