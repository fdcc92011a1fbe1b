//! HiGHS backend built on good_lp
//!
//! Each call builds a fresh good_lp model from the borrowed rows, so the
//! backend holds no per-solve state and can be shared across worker threads.

use good_lp::solvers::highs::highs;
use good_lp::solvers::SolutionStatus;
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};

use super::super::problem::{ObjectiveSense, Row};
use super::{LinearModel, RawSolution, SolveFailure, Solver, SolverConfig};

/// Solver backed by HiGHS (branch-and-bound for integer models, simplex for
/// continuous ones)
#[derive(Debug, Clone, Default)]
pub struct HighsSolver {
    config: SolverConfig,
}

impl HighsSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
}

impl From<ResolutionError> for SolveFailure {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::Infeasible => SolveFailure::Infeasible,
            ResolutionError::Unbounded => SolveFailure::Unbounded,
            other => SolveFailure::Solver(other.to_string()),
        }
    }
}

fn row_expression(row: &Row, x: &[Variable]) -> Expression {
    row.coefficients
        .iter()
        .map(|&(j, a)| a * x[j])
        .sum()
}

impl Solver for HighsSolver {
    fn solve(&self, model: &LinearModel<'_>) -> Result<RawSolution, SolveFailure> {
        let mut vars = ProblemVariables::new();

        let x: Vec<Variable> = model
            .variables
            .iter()
            .map(|v| {
                let mut def = variable();
                if let Some(lo) = v.lower {
                    def = def.min(lo);
                }
                if let Some(hi) = v.upper {
                    def = def.max(hi);
                }
                if v.integer {
                    def = def.integer();
                }
                vars.add(def)
            })
            .collect();

        let objective: Expression = model
            .cost
            .iter()
            .zip(&x)
            .filter(|(c, _)| **c != 0.0)
            .map(|(&c, &v)| c * v)
            .sum();

        let unsolved = match model.sense {
            ObjectiveSense::Minimize => vars.minimise(objective),
            ObjectiveSense::Maximize => vars.maximise(objective),
        };
        let mut problem = unsolved
            .using(highs)
            .set_time_limit(self.config.timeout_seconds);

        for row in &model.inequalities {
            let lhs = row_expression(row, &x);
            let rhs = row.rhs;
            problem = problem.with(constraint!(lhs <= rhs));
        }
        for row in &model.equalities {
            let lhs = row_expression(row, &x);
            let rhs = row.rhs;
            problem = problem.with(constraint!(lhs == rhs));
        }

        let solution = problem.solve()?;
        // an early stop still returns a point, but not an optimal one
        match solution.status() {
            SolutionStatus::Optimal => {}
            SolutionStatus::TimeLimit => return Err(SolveFailure::TimeLimit),
            other => {
                return Err(SolveFailure::Solver(format!(
                    "stopped before optimality ({:?})",
                    other
                )))
            }
        }

        let values: Vec<f64> = x.iter().map(|&v| solution.value(v)).collect();
        let objective = model.cost.iter().zip(&values).map(|(c, v)| c * v).sum();

        Ok(RawSolution {
            x: values,
            objective,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::solver::ModelVariable;

    #[test]
    fn test_solve_small_milp() {
        // max x + y  s.t.  2x + 2y <= 5, x, y integer in [0, 10]
        let row = Row {
            coefficients: vec![(0, 2.0), (1, 2.0)],
            rhs: 5.0,
        };
        let bounded = ModelVariable {
            lower: Some(0.0),
            upper: Some(10.0),
            integer: true,
        };
        let model = LinearModel {
            sense: ObjectiveSense::Maximize,
            cost: &[1.0, 1.0],
            inequalities: vec![&row],
            equalities: Vec::new(),
            variables: vec![bounded, bounded],
        };

        let solution = HighsSolver::default().solve(&model).unwrap();
        assert!((solution.objective - 2.0).abs() < 1e-6);
        assert!(solution.x.iter().all(|v| (v - v.round()).abs() < 1e-6));
    }

    #[test]
    fn test_infeasible_model() {
        // x <= -1 and x >= 0
        let upper = Row {
            coefficients: vec![(0, 1.0)],
            rhs: -1.0,
        };
        let model = LinearModel {
            sense: ObjectiveSense::Minimize,
            cost: &[1.0],
            inequalities: vec![&upper],
            equalities: Vec::new(),
            variables: vec![ModelVariable {
                lower: Some(0.0),
                upper: None,
                integer: false,
            }],
        };

        // presolve may classify this as infeasible or as a generic failure
        assert!(HighsSolver::default().solve(&model).is_err());
    }

    #[test]
    fn test_zero_time_limit() {
        let row = Row {
            coefficients: vec![(0, 2.0), (1, 2.0)],
            rhs: 5.0,
        };
        let bounded = ModelVariable {
            lower: Some(0.0),
            upper: Some(10.0),
            integer: true,
        };
        let model = LinearModel {
            sense: ObjectiveSense::Maximize,
            cost: &[1.0, 1.0],
            inequalities: vec![&row],
            equalities: Vec::new(),
            variables: vec![bounded, bounded],
        };
        let solver = HighsSolver::new(SolverConfig {
            timeout_seconds: 0.0,
        });

        // a stopped solve is an error, never a suboptimal point
        match solver.solve(&model) {
            Err(failure) => assert!(!matches!(
                failure,
                SolveFailure::Infeasible | SolveFailure::Unbounded
            )),
            Ok(solution) => assert!((solution.objective - 2.0).abs() < 1e-6),
        }
    }
}
