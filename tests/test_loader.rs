//! Tests for loading parameter tables from CSV and Parquet files

mod common;

use polars::prelude::*;
use tempfile::TempDir;

use stratlearn::pipeline::{instances_from_frame, load_dataset, load_instances};
use stratlearn::OptimizerError;

#[test]
fn test_load_csv_flattened_columns() {
    let instances = common::sample_instances(6, 21);
    let mut df = common::instances_dataframe(&instances);
    let (_dir, path) = common::create_temp_csv(&mut df);

    let loaded = load_instances(&path, &common::facility_problem(), 10000).unwrap();
    assert_eq!(loaded.len(), 6);
    for (a, b) in loaded.iter().zip(&instances) {
        let (a, b) = (a.get("d").unwrap(), b.get("d").unwrap());
        assert!((a[0] - b[0]).abs() < 1e-9);
        assert!((a[1] - b[1]).abs() < 1e-9);
    }
}

#[test]
fn test_load_parquet() {
    let mut df = df! {
        "d_0" => [1.0, 2.0, 3.0],
        "d_1" => [4.0, 5.0, 6.0],
    }
    .unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("instances.parquet");
    let file = std::fs::File::create(&path).unwrap();
    ParquetWriter::new(file).finish(&mut df).unwrap();

    let frame = load_dataset(&path, 0).unwrap();
    assert_eq!(frame.shape(), (3, 2));
    let instances = instances_from_frame(&frame, &common::facility_problem()).unwrap();
    assert_eq!(instances[2].get("d"), Some(&[3.0, 6.0][..]));
}

#[test]
fn test_list_column() {
    let rows = vec![
        Series::new("".into(), [1.0, 2.0]),
        Series::new("".into(), [3.0, 4.0]),
    ];
    let df = DataFrame::new(vec![Column::new("d".into(), rows)]).unwrap();

    let instances = instances_from_frame(&df, &common::facility_problem()).unwrap();
    assert_eq!(instances[0].get("d"), Some(&[1.0, 2.0][..]));
    assert_eq!(instances[1].get("d"), Some(&[3.0, 4.0][..]));
}

#[test]
fn test_list_column_wrong_size() {
    let rows = vec![Series::new("".into(), [1.0, 2.0, 3.0])];
    let df = DataFrame::new(vec![Column::new("d".into(), rows)]).unwrap();

    let err = instances_from_frame(&df, &common::facility_problem()).unwrap_err();
    assert!(matches!(
        err,
        OptimizerError::ParameterSize {
            expected: 2,
            found: 3,
            ..
        }
    ));
}

#[test]
fn test_missing_column() {
    let df = df! { "other" => [1.0] }.unwrap();
    let err = instances_from_frame(&df, &common::facility_problem()).unwrap_err();
    assert!(matches!(err, OptimizerError::MissingParameter { .. }));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("instances.txt");
    std::fs::write(&path, "d_0,d_1\n1,2\n").unwrap();
    assert!(load_dataset(&path, 100).is_err());
}
