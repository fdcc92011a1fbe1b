//! Performance export to CSV and JSON

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use polars::prelude::*;
use serde::Serialize;

use crate::pipeline::{InstanceDetail, LearnerKind, PerformanceSummary};

/// Metadata about the evaluation run
#[derive(Serialize)]
pub struct EvaluationMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    pub stratlearn_version: String,
    /// Learned model folder
    pub model: String,
    /// Parameter table evaluated
    pub input_file: String,
    pub learner: String,
    pub n_best: usize,
}

/// Complete evaluation export
#[derive(Serialize)]
pub struct PerformanceExport<'a> {
    pub metadata: EvaluationMetadata,
    pub summary: &'a PerformanceSummary,
    pub instances: &'a [InstanceDetail],
}

/// Parameters recorded in the JSON metadata
pub struct ExportParams<'a> {
    pub model: &'a Path,
    pub input_file: &'a Path,
    pub learner: LearnerKind,
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    CsvWriter::new(&mut file)
        .finish(df)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    Ok(())
}

/// Write `<name>_general.csv` and `<name>_detail.csv` into `dir`.
///
/// Returns the two paths in that order.
pub fn export_performance_csv(
    summary: &PerformanceSummary,
    details: &[InstanceDetail],
    dir: &Path,
) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let general_path = dir.join(format!("{}_general.csv", summary.problem));
    let detail_path = dir.join(format!("{}_detail.csv", summary.problem));

    write_csv(&mut summary.to_frame()?, &general_path)?;
    write_csv(&mut InstanceDetail::to_frame(details)?, &detail_path)?;

    Ok((general_path, detail_path))
}

/// Export the summary and per-instance details to a JSON file with run metadata
pub fn export_performance_json(
    summary: &PerformanceSummary,
    details: &[InstanceDetail],
    output_path: &Path,
    params: &ExportParams,
) -> Result<()> {
    let export = PerformanceExport {
        metadata: EvaluationMetadata {
            timestamp: Utc::now().to_rfc3339(),
            stratlearn_version: env!("CARGO_PKG_VERSION").to_string(),
            model: params.model.display().to_string(),
            input_file: params.input_file.display().to_string(),
            learner: params.learner.to_string(),
            n_best: summary.n_best,
        },
        summary,
        instances: details,
    };

    let json = serde_json::to_string_pretty(&export)
        .context("Failed to serialize performance report to JSON")?;

    std::fs::write(output_path, json).with_context(|| {
        format!(
            "Failed to write performance report to {}",
            output_path.display()
        )
    })?;

    Ok(())
}
