//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::path::PathBuf;

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

use stratlearn::pipeline::solver::{LinearModel, RawSolution};
use stratlearn::pipeline::{
    Affine, ConstraintSense, Instance, ObjectiveSense, ProblemTemplate, SolveFailure, Solver,
    VariableSpec,
};

pub const FIXED_COST: [f64; 3] = [4.0, 6.0, 5.0];
pub const CAPACITY: [f64; 3] = [6.0, 8.0, 10.0];
pub const SHIPPING: [[f64; 2]; 3] = [[1.0, 3.0], [2.0, 1.0], [3.0, 2.0]];

/// Small facility location problem
///
/// Three facilities with fixed opening costs and capacities serve two stores
/// whose demands form the parameter `d` (size 2).
///
/// - `x_i_j >= 0`: amount shipped from facility i to store j
/// - `y_i in {0, 1}`: facility i is open
/// - demand: `sum_i x_i_j >= d_j`
/// - supply: `sum_j x_i_j - capacity_i * y_i <= 0`
pub fn facility_problem() -> ProblemTemplate {
    let mut problem = ProblemTemplate::new("facility", ObjectiveSense::Minimize);
    problem.add_parameter("d", 2);

    let mut x = [[0usize; 2]; 3];
    for (i, row) in x.iter_mut().enumerate() {
        for (j, slot) in row.iter_mut().enumerate() {
            *slot = problem.add_variable(
                VariableSpec::continuous(format!("x_{}_{}", i, j)).bounded(Some(0.0), None),
            );
            problem.add_cost(*slot, SHIPPING[i][j]);
        }
    }
    let y: Vec<usize> = (0..3)
        .map(|i| {
            let v = problem
                .add_variable(VariableSpec::integer(format!("y_{}", i)).bounded(Some(0.0), Some(1.0)));
            problem.add_cost(v, FIXED_COST[i]);
            v
        })
        .collect();

    for j in 0..2 {
        problem.add_constraint(
            (0..3).map(|i| (x[i][j], 1.0)).collect(),
            ConstraintSense::Ge,
            Affine::param("d", j),
        );
    }
    for i in 0..3 {
        problem.add_constraint(
            vec![(x[i][0], 1.0), (x[i][1], 1.0), (y[i], -CAPACITY[i])],
            ConstraintSense::Le,
            0.0,
        );
    }

    problem
}

pub fn demand(d0: f64, d1: f64) -> Instance {
    Instance::new().with("d", vec![d0, d1])
}

/// Demands drawn uniformly from `[1, 9)` with a fixed seed
pub fn sample_instances(n: usize, seed: u64) -> Vec<Instance> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| demand(rng.gen_range(1.0..9.0), rng.gen_range(1.0..9.0)))
        .collect()
}

/// Parameter table with flattened `d_0`, `d_1` columns
pub fn instances_dataframe(instances: &[Instance]) -> DataFrame {
    let column = |k: usize| -> Vec<f64> {
        instances
            .iter()
            .map(|inst| inst.get("d").map_or(f64::NAN, |d| d[k]))
            .collect()
    };
    df! {
        "d_0" => column(0),
        "d_1" => column(1),
    }
    .unwrap()
}

/// Write a DataFrame to a CSV file in a fresh temp dir
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("instances.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
    (temp_dir, path)
}

/// Write the facility problem template to `dir/problem.json`
pub fn write_problem_json(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("problem.json");
    std::fs::write(&path, serde_json::to_string_pretty(&facility_problem()).unwrap()).unwrap();
    path
}

/// Returns the origin for every model, like a solve stopped before it
/// found a feasible point
pub struct OriginSolver;

impl Solver for OriginSolver {
    fn solve(&self, model: &LinearModel<'_>) -> Result<RawSolution, SolveFailure> {
        Ok(RawSolution {
            x: vec![0.0; model.variables.len()],
            objective: 0.0,
        })
    }
}

/// Always stops on the time limit
pub struct TimeLimitSolver;

impl Solver for TimeLimitSolver {
    fn solve(&self, _model: &LinearModel<'_>) -> Result<RawSolution, SolveFailure> {
        Err(SolveFailure::TimeLimit)
    }
}
