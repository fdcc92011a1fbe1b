//! Tests for the parametric solve driver and strategy-constrained resolution

mod common;

use common::{OriginSolver, TimeLimitSolver};
use stratlearn::pipeline::{
    resolve_strategy, solve_parametric, solve_with_strategy, Execution, HighsSolver, Instance,
    SolverConfig, Strategy, FAILURE_SENTINEL, TOL,
};
use stratlearn::OptimizerError;

#[test]
fn test_full_solve_known_optimum() {
    let problem = common::facility_problem();
    let solver = HighsSolver::default();

    // only facility 1 open: 6 + 2 * 3 + 1 * 4
    let results = solve_parametric(
        &problem,
        &[common::demand(3.0, 4.0)],
        &solver,
        Execution::Sequential,
    )
    .unwrap();

    let res = &results[0];
    assert!((res.cost - 16.0).abs() < 1e-6, "cost was {}", res.cost);
    assert!(res.infeasibility <= TOL);
    assert_eq!(res.x.len(), problem.num_var());

    let strategy = res.strategy.as_ref().unwrap();
    assert_eq!(strategy.integers(), &[0, 1, 0]);
    assert_eq!(strategy.binding().len(), problem.num_inequalities());
    // both demand rows are tight, facility 1 has spare capacity
    assert!(strategy.binding()[0] && strategy.binding()[1]);
    assert!(!strategy.binding()[3]);
}

#[test]
fn test_sequential_and_parallel_agree() {
    let problem = common::facility_problem();
    let instances = common::sample_instances(16, 7);
    let solver = HighsSolver::default();

    let sequential = solve_parametric(&problem, &instances, &solver, Execution::Sequential).unwrap();
    let parallel = solve_parametric(
        &problem,
        &instances,
        &solver,
        Execution::Parallel { threads: 4 },
    )
    .unwrap();

    assert_eq!(sequential.len(), instances.len());
    assert_eq!(parallel.len(), instances.len());
    for (s, p) in sequential.iter().zip(&parallel) {
        assert_eq!(s.strategy, p.strategy);
        assert!((s.cost - p.cost).abs() < 1e-6);
    }
}

#[test]
fn test_true_strategy_recovers_optimum() {
    let problem = common::facility_problem();
    let instances = common::sample_instances(10, 11);
    let solver = HighsSolver::default();

    let results = solve_parametric(&problem, &instances, &solver, Execution::default()).unwrap();

    for (instance, full) in instances.iter().zip(&results) {
        let strategy = full.strategy.as_ref().unwrap();
        let reduced = solve_with_strategy(&problem, instance, strategy, &solver).unwrap();

        assert!(reduced.infeasibility <= TOL, "infeasibility {}", reduced.infeasibility);
        assert!(
            (reduced.cost - full.cost).abs() <= 1e-6 * full.cost.abs().max(1.0),
            "reduced cost {} vs full cost {}",
            reduced.cost,
            full.cost
        );
        assert_eq!(reduced.strategy.as_ref(), Some(strategy));
    }
}

#[test]
fn test_infeasible_instance_gets_sentinel() {
    let problem = common::facility_problem();
    // total demand exceeds the total capacity of 24
    let instances = vec![common::demand(20.0, 20.0), common::demand(2.0, 2.0)];

    let results =
        solve_parametric(&problem, &instances, &HighsSolver::default(), Execution::Sequential)
            .unwrap();

    assert_eq!(results[0].cost, FAILURE_SENTINEL);
    assert_eq!(results[0].infeasibility, FAILURE_SENTINEL);
    assert!(results[0].strategy.is_none());
    assert!(results[0].x.is_empty());

    // the failure does not affect the next instance
    assert!(results[1].is_feasible());
}

#[test]
fn test_mismatched_strategy_gets_sentinel() {
    let problem = common::facility_problem();
    let populated = problem.populate(&common::demand(3.0, 4.0)).unwrap();
    let strategy = Strategy::new(vec![true, false], vec![1]);

    let res = resolve_strategy(&populated, &strategy, &HighsSolver::default());
    assert_eq!(res.cost, FAILURE_SENTINEL);
    assert_eq!(res.infeasibility, FAILURE_SENTINEL);
    assert!(!res.is_feasible());
}

#[test]
fn test_foreign_strategy_is_verified_against_full_problem() {
    let problem = common::facility_problem();
    let solver = HighsSolver::default();

    // strategy of a small demand applied to a demand only facility 2 can cover
    let small = solve_parametric(&problem, &[common::demand(3.0, 4.0)], &solver, Execution::Sequential)
        .unwrap();
    let strategy = small[0].strategy.clone().unwrap();

    let res = solve_with_strategy(&problem, &common::demand(8.0, 8.0), &strategy, &solver).unwrap();
    assert!(!res.is_feasible());
    assert!(res.infeasibility > TOL);
}

#[test]
fn test_missing_parameter_is_fatal() {
    let problem = common::facility_problem();
    let instances = vec![common::demand(1.0, 1.0), Instance::new().with("d", vec![1.0])];

    let err = solve_parametric(&problem, &instances, &HighsSolver::default(), Execution::Sequential)
        .unwrap_err();
    assert!(matches!(
        err,
        OptimizerError::ParameterSize {
            expected: 2,
            found: 1,
            ..
        }
    ));
}

#[test]
fn test_infeasible_point_records_no_strategy() {
    let problem = common::facility_problem();
    let results = solve_parametric(
        &problem,
        &[common::demand(3.0, 4.0)],
        &OriginSolver,
        Execution::Sequential,
    )
    .unwrap();

    // x = 0 leaves both demand rows unmet
    assert!((results[0].infeasibility - 4.0).abs() < 1e-9);
    assert!(!results[0].is_feasible());
    assert!(results[0].strategy.is_none());
}

#[test]
fn test_time_limit_gets_sentinel() {
    let problem = common::facility_problem();
    let results = solve_parametric(
        &problem,
        &common::sample_instances(3, 2),
        &TimeLimitSolver,
        Execution::Parallel { threads: 2 },
    )
    .unwrap();

    assert_eq!(results.len(), 3);
    for res in &results {
        assert_eq!(res.cost, FAILURE_SENTINEL);
        assert_eq!(res.infeasibility, FAILURE_SENTINEL);
        assert!(res.strategy.is_none());
    }
}

#[test]
fn test_zero_timeout_never_yields_a_wrong_strategy() {
    let problem = common::facility_problem();
    let instances = common::sample_instances(6, 13);

    let exact = solve_parametric(
        &problem,
        &instances,
        &HighsSolver::default(),
        Execution::Sequential,
    )
    .unwrap();
    let limited = solve_parametric(
        &problem,
        &instances,
        &HighsSolver::new(SolverConfig {
            timeout_seconds: 0.0,
        }),
        Execution::Sequential,
    )
    .unwrap();

    // a stopped solve is a failure, a finished one is the true optimum
    for (l, e) in limited.iter().zip(&exact) {
        match &l.strategy {
            None => assert_eq!(l.cost, FAILURE_SENTINEL),
            Some(_) => {
                assert!(l.is_feasible());
                assert!((l.cost - e.cost).abs() <= 1e-6 * e.cost.abs().max(1.0));
            }
        }
    }
}

#[test]
fn test_nan_parameter_is_fatal() {
    let problem = common::facility_problem();
    let instances = vec![common::demand(3.0, f64::NAN)];

    let err = solve_parametric(&problem, &instances, &HighsSolver::default(), Execution::Sequential)
        .unwrap_err();
    assert!(matches!(
        err,
        OptimizerError::NonFiniteParameter { index: 1, .. }
    ));
}
