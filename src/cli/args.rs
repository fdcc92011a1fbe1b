//! Command-line argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::pipeline::{Execution, LearnerConfig, LearnerKind, SolverConfig};

/// stratlearn - Learn the optimal strategies of a parametric mixed-integer program
#[derive(Parser, Debug)]
#[command(name = "stratlearn")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that runs the solver
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Number of worker threads (0 uses one per CPU core)
    #[arg(long, default_value = "0")]
    pub threads: usize,

    /// Solve instances one after another instead of in parallel
    #[arg(long, default_value = "false")]
    pub sequential: bool,

    /// Solver timeout in seconds per solve
    #[arg(long, default_value = "30", value_parser = validate_timeout)]
    pub solver_timeout: f64,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

impl RunArgs {
    pub fn execution(&self) -> Execution {
        if self.sequential {
            Execution::Sequential
        } else {
            Execution::Parallel {
                threads: self.threads,
            }
        }
    }

    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            timeout_seconds: self.solver_timeout,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve a training set in full, encode its strategies and fit a learner
    Train {
        /// Problem template (JSON)
        #[arg(short, long)]
        problem: PathBuf,

        /// Parameter table (CSV or Parquet), one instance per row
        #[arg(short, long)]
        data: PathBuf,

        /// Folder to write the trained optimizer to
        #[arg(short, long)]
        output: PathBuf,

        /// Learner: "knn" (default) or "centroid"
        #[arg(long, default_value = "knn")]
        learner: LearnerKind,

        /// Candidate strategies tried per instance
        #[arg(long, default_value = "3", value_parser = validate_positive)]
        n_best: usize,

        /// Neighbourhood size for the knn learner
        #[arg(long, default_value = "5", value_parser = validate_positive)]
        neighbors: usize,

        /// Replace the output folder if it already exists
        #[arg(long, default_value = "false")]
        overwrite: bool,

        /// Also save the encoded training set to this JSON file
        #[arg(long)]
        save_data: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Compare a trained optimizer against full solves on a test set
    Evaluate {
        /// Folder written by `train`
        #[arg(short, long)]
        model: PathBuf,

        /// Parameter table (CSV or Parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Directory for `<problem>_general.csv` and `<problem>_detail.csv`
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Write the summary and details as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Predict solutions for new instances
    Solve {
        /// Folder written by `train`
        #[arg(short, long)]
        model: PathBuf,

        /// Parameter table (CSV or Parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Output CSV with one row per instance
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },
}

impl Commands {
    /// Learner configuration for `train`
    pub fn learner_config(&self) -> Option<LearnerConfig> {
        match self {
            Commands::Train {
                learner,
                n_best,
                neighbors,
                ..
            } => Some(LearnerConfig {
                kind: *learner,
                n_best: *n_best,
                neighbors: *neighbors,
            }),
            _ => None,
        }
    }
}

fn validate_positive(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value == 0 {
        return Err("value must be at least 1".to_string());
    }
    Ok(value)
}

fn validate_timeout(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !(value > 0.0 && value.is_finite()) {
        return Err(format!("solver timeout must be positive, got {}", value));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from([
            "stratlearn", "train", "-p", "p.json", "-d", "d.csv", "-o", "model",
        ])
        .unwrap();

        let config = cli.command.learner_config().unwrap();
        assert_eq!(config.kind, LearnerKind::NearestNeighbors);
        assert_eq!(config.n_best, 3);
        match cli.command {
            Commands::Train { overwrite, run, .. } => {
                assert!(!overwrite);
                assert_eq!(run.execution(), Execution::Parallel { threads: 0 });
                assert_eq!(run.solver_config().timeout_seconds, 30.0);
            }
            _ => panic!("expected train"),
        }
    }

    #[test]
    fn test_sequential_and_learner() {
        let cli = Cli::try_parse_from([
            "stratlearn",
            "train",
            "-p",
            "p.json",
            "-d",
            "d.csv",
            "-o",
            "model",
            "--learner",
            "centroid",
            "--sequential",
        ])
        .unwrap();

        assert_eq!(
            cli.command.learner_config().unwrap().kind,
            LearnerKind::NearestCentroid
        );
        match cli.command {
            Commands::Train { run, .. } => assert_eq!(run.execution(), Execution::Sequential),
            _ => panic!("expected train"),
        }
    }

    #[test]
    fn test_rejects_zero_n_best() {
        let result = Cli::try_parse_from([
            "stratlearn", "train", "-p", "p.json", "-d", "d.csv", "-o", "m", "--n-best", "0",
        ]);
        assert!(result.is_err());
    }
}
