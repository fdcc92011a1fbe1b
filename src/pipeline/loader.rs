//! Parameter table loader for CSV and Parquet files
//!
//! Each row of the table is one problem instance. A parameter of size 1 is
//! read from the column of the same name. A larger parameter is read either
//! from a list column `name` or from flattened columns `name_0 .. name_{k-1}`.

use std::path::Path;

use log::info;
use polars::prelude::*;

use crate::error::{OptimizerError, Result};

use super::instance::Instance;
use super::problem::{ParameterSpec, ProblemTemplate};

/// Load a dataset from a file (CSV or Parquet based on extension).
///
/// `infer_schema_length == 0` scans the whole CSV file to infer types.
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let lf = match extension.as_str() {
        "csv" => {
            let schema_length = (infer_schema_length > 0).then_some(infer_schema_length);
            LazyCsvReader::new(path)
                .with_infer_schema_length(schema_length)
                .finish()?
        }
        "parquet" => LazyFrame::scan_parquet(path, Default::default())?,
        _ => {
            return Err(OptimizerError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "Unsupported file format: '{}'. Supported formats: csv, parquet",
                    extension
                ),
            )))
        }
    };

    let df = lf.collect()?;
    info!(
        "Loaded {} row(s) x {} column(s) from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Build one `Instance` per row, reading the parameters the problem declares.
/// Extra columns are ignored.
pub fn instances_from_frame(df: &DataFrame, problem: &ProblemTemplate) -> Result<Vec<Instance>> {
    let mut instances = vec![Instance::new(); df.height()];

    for spec in &problem.parameters {
        let rows = read_parameter(df, spec)?;
        for (instance, values) in instances.iter_mut().zip(rows) {
            instance.insert(spec.name.clone(), values);
        }
    }

    Ok(instances)
}

/// Load a parameter table and convert it to instances in one step
pub fn load_instances(
    path: &Path,
    problem: &ProblemTemplate,
    infer_schema_length: usize,
) -> Result<Vec<Instance>> {
    let df = load_dataset(path, infer_schema_length)?;
    instances_from_frame(&df, problem)
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Values of one parameter for every row
fn read_parameter(df: &DataFrame, spec: &ParameterSpec) -> Result<Vec<Vec<f64>>> {
    if has_column(df, &spec.name) {
        let column = df.column(&spec.name)?;
        if let DataType::List(_) = column.dtype() {
            return read_list_column(column, spec);
        }
        if spec.size == 1 {
            let values = read_scalar_column(column, &spec.name)?;
            return Ok(values.into_iter().map(|v| vec![v]).collect());
        }
        return Err(OptimizerError::ParameterSize {
            name: spec.name.clone(),
            expected: spec.size,
            found: 1,
        });
    }

    if spec.size > 1 {
        let mut rows = vec![Vec::with_capacity(spec.size); df.height()];
        for k in 0..spec.size {
            let flat = format!("{}_{}", spec.name, k);
            if !has_column(df, &flat) {
                return Err(OptimizerError::MissingParameter {
                    name: spec.name.clone(),
                });
            }
            let values = read_scalar_column(df.column(&flat)?, &spec.name)?;
            for (row, v) in rows.iter_mut().zip(values) {
                row.push(v);
            }
        }
        return Ok(rows);
    }

    Err(OptimizerError::MissingParameter {
        name: spec.name.clone(),
    })
}

fn read_scalar_column(column: &Column, name: &str) -> Result<Vec<f64>> {
    let float_col = column.cast(&DataType::Float64)?;
    float_col
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| OptimizerError::MissingValue {
                name: name.to_string(),
                row,
            })
        })
        .collect()
}

fn read_list_column(column: &Column, spec: &ParameterSpec) -> Result<Vec<Vec<f64>>> {
    let lists = column.as_materialized_series().list()?;

    lists
        .into_iter()
        .enumerate()
        .map(|(row, cell)| {
            let missing = || OptimizerError::MissingValue {
                name: spec.name.clone(),
                row,
            };
            let series = cell.ok_or_else(missing)?;
            let values = series
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| v.ok_or_else(missing))
                .collect::<Result<Vec<f64>>>()?;

            if values.len() != spec.size {
                return Err(OptimizerError::ParameterSize {
                    name: spec.name.clone(),
                    expected: spec.size,
                    found: values.len(),
                });
            }
            Ok(values)
        })
        .collect()
}
