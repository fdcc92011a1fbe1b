//! Parametric problem templates and their numeric population
//!
//! A `ProblemTemplate` describes a mixed-integer linear program whose
//! objective coefficients and right-hand sides are affine functions of named
//! parameters. Populating it with an `Instance` yields a `PopulatedProblem`
//! in canonical form:
//!
//! * inequality rows `G x <= h`: `<=` constraints, negated `>=` constraints,
//!   then finite variable bounds in variable order
//! * equality rows `E x = f`
//!
//! The order of the inequality rows is the index space of
//! `Strategy::binding`.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use faer::Mat;
use serde::{Deserialize, Serialize};

use crate::error::{OptimizerError, Result};

use super::instance::Instance;
use super::solver::{LinearModel, ModelVariable};
use super::strategy::Strategy;
use super::{FAILURE_SENTINEL, TOL};

fn one() -> f64 {
    1.0
}

/// Declared parameter: a named block of `size` values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(default = "default_size")]
    pub size: usize,
}

fn default_size() -> usize {
    1
}

/// Reference to one entry of a parameter, scaled by `coef`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamTerm {
    pub param: String,
    #[serde(default)]
    pub index: usize,
    #[serde(default = "one")]
    pub coef: f64,
}

/// Affine function of the parameters: `constant + sum(coef * param[index])`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    #[serde(default)]
    pub constant: f64,
    #[serde(default)]
    pub terms: Vec<ParamTerm>,
}

impl Affine {
    pub fn constant(value: f64) -> Self {
        Self {
            constant: value,
            terms: Vec::new(),
        }
    }

    pub fn param(name: impl Into<String>, index: usize) -> Self {
        Self::default().plus_param(name, index, 1.0)
    }

    pub fn plus_param(mut self, name: impl Into<String>, index: usize, coef: f64) -> Self {
        self.terms.push(ParamTerm {
            param: name.into(),
            index,
            coef,
        });
        self
    }

    fn eval(&self, values: &HashMap<&str, &[f64]>) -> f64 {
        self.terms.iter().fold(self.constant, |acc, term| {
            acc + term.coef * values[term.param.as_str()][term.index]
        })
    }
}

impl From<f64> for Affine {
    fn from(value: f64) -> Self {
        Affine::constant(value)
    }
}

/// Decision variable declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    #[serde(default)]
    pub lower: Option<f64>,
    #[serde(default)]
    pub upper: Option<f64>,
    #[serde(default)]
    pub integer: bool,
}

impl VariableSpec {
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lower: None,
            upper: None,
            integer: false,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            integer: true,
            ..Self::continuous(name)
        }
    }

    pub fn bounded(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveSense {
    #[default]
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintSense {
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
}

/// One linear constraint with a constant row and a parametric right-hand side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSpec {
    #[serde(default)]
    pub name: Option<String>,
    /// Sparse row as `(variable index, coefficient)` pairs
    pub coefficients: Vec<(usize, f64)>,
    pub sense: ConstraintSense,
    pub rhs: Affine,
}

/// Cost coefficient of one variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostTerm {
    pub variable: usize,
    pub coefficient: Affine,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    #[serde(default)]
    pub sense: ObjectiveSense,
    #[serde(default)]
    pub terms: Vec<CostTerm>,
    #[serde(default)]
    pub constant: Affine,
}

/// Symbolic parametric mixed-integer linear program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemTemplate {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    pub variables: Vec<VariableSpec>,
    pub objective: Objective,
    #[serde(default)]
    pub constraints: Vec<ConstraintSpec>,
}

impl ProblemTemplate {
    pub fn new(name: impl Into<String>, sense: ObjectiveSense) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            variables: Vec::new(),
            objective: Objective {
                sense,
                ..Default::default()
            },
            constraints: Vec::new(),
        }
    }

    pub fn add_parameter(&mut self, name: impl Into<String>, size: usize) {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            size,
        });
    }

    /// Add a variable and return its index
    pub fn add_variable(&mut self, spec: VariableSpec) -> usize {
        self.variables.push(spec);
        self.variables.len() - 1
    }

    pub fn add_cost(&mut self, variable: usize, coefficient: impl Into<Affine>) {
        self.objective.terms.push(CostTerm {
            variable,
            coefficient: coefficient.into(),
        });
    }

    pub fn add_constraint(
        &mut self,
        coefficients: Vec<(usize, f64)>,
        sense: ConstraintSense,
        rhs: impl Into<Affine>,
    ) {
        self.constraints.push(ConstraintSpec {
            name: None,
            coefficients,
            sense,
            rhs: rhs.into(),
        });
    }

    /// Load a template from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let problem: ProblemTemplate = serde_json::from_str(&text)?;
        problem.validate()?;
        Ok(problem)
    }

    /// Check structural consistency of the template
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(OptimizerError::InvalidProblem(msg));

        if self.variables.is_empty() {
            return invalid(format!("problem '{}' has no variables", self.name));
        }

        let mut sizes: HashMap<&str, usize> = HashMap::new();
        for param in &self.parameters {
            if param.size == 0 {
                return invalid(format!("parameter '{}' has size 0", param.name));
            }
            if sizes.insert(param.name.as_str(), param.size).is_some() {
                return invalid(format!("parameter '{}' is declared twice", param.name));
            }
        }

        let mut names = HashSet::new();
        for var in &self.variables {
            if !names.insert(var.name.as_str()) {
                return invalid(format!("variable '{}' is declared twice", var.name));
            }
            if let (Some(lo), Some(hi)) = (var.lower, var.upper) {
                if lo > hi {
                    return invalid(format!(
                        "variable '{}' has lower bound {} above upper bound {}",
                        var.name, lo, hi
                    ));
                }
            }
        }

        let n = self.variables.len();
        let check_affine = |affine: &Affine, context: &str| -> Result<()> {
            for term in &affine.terms {
                match sizes.get(term.param.as_str()) {
                    None => {
                        return invalid(format!(
                            "{} references undeclared parameter '{}'",
                            context, term.param
                        ))
                    }
                    Some(&size) if term.index >= size => {
                        return invalid(format!(
                            "{} references {}[{}] but the parameter has size {}",
                            context, term.param, term.index, size
                        ))
                    }
                    Some(_) => {}
                }
            }
            Ok(())
        };

        for term in &self.objective.terms {
            if term.variable >= n {
                return invalid(format!("objective references variable {}", term.variable));
            }
            check_affine(&term.coefficient, "objective")?;
        }
        check_affine(&self.objective.constant, "objective constant")?;

        for (k, con) in self.constraints.iter().enumerate() {
            let label = con.name.clone().unwrap_or_else(|| format!("constraint {}", k));
            if let Some((j, _)) = con.coefficients.iter().find(|(j, _)| *j >= n) {
                return invalid(format!("{} references variable {}", label, j));
            }
            check_affine(&con.rhs, &label)?;
        }

        Ok(())
    }

    pub fn num_var(&self) -> usize {
        self.variables.len()
    }

    /// Number of canonical inequality rows (length of `Strategy::binding`)
    pub fn num_inequalities(&self) -> usize {
        let rows = self
            .constraints
            .iter()
            .filter(|c| c.sense != ConstraintSense::Eq)
            .count();
        let bounds: usize = self
            .variables
            .iter()
            .map(|v| v.lower.is_some() as usize + v.upper.is_some() as usize)
            .sum();
        rows + bounds
    }

    /// Total number of canonical rows, bounds included
    pub fn num_constraints(&self) -> usize {
        let equalities = self
            .constraints
            .iter()
            .filter(|c| c.sense == ConstraintSense::Eq)
            .count();
        self.num_inequalities() + equalities
    }

    pub fn num_integer(&self) -> usize {
        self.variables.iter().filter(|v| v.integer).count()
    }

    /// Length of the learner's feature vector
    pub fn n_features(&self) -> usize {
        self.parameters.iter().map(|p| p.size).sum()
    }

    fn bind<'a>(&self, instance: &'a Instance) -> Result<HashMap<&str, &'a [f64]>> {
        self.parameters
            .iter()
            .map(|p| Ok((p.name.as_str(), instance.require(&p.name, p.size)?)))
            .collect()
    }

    /// Evaluate every parametric coefficient for one instance.
    ///
    /// The template is validated first, so a malformed template is reported
    /// as `InvalidProblem` rather than indexing out of range.
    pub fn populate(&self, instance: &Instance) -> Result<PopulatedProblem> {
        self.validate()?;
        let values = self.bind(instance)?;
        let n = self.variables.len();

        let mut cost = vec![0.0; n];
        for term in &self.objective.terms {
            cost[term.variable] += term.coefficient.eval(&values);
        }
        let cost_constant = self.objective.constant.eval(&values);

        let mut inequalities = Vec::with_capacity(self.num_inequalities());
        let mut equalities = Vec::new();
        for con in &self.constraints {
            let rhs = con.rhs.eval(&values);
            match con.sense {
                ConstraintSense::Le => inequalities.push(Row {
                    coefficients: con.coefficients.clone(),
                    rhs,
                }),
                ConstraintSense::Ge => inequalities.push(Row {
                    coefficients: con.coefficients.iter().map(|&(j, a)| (j, -a)).collect(),
                    rhs: -rhs,
                }),
                ConstraintSense::Eq => equalities.push(Row {
                    coefficients: con.coefficients.clone(),
                    rhs,
                }),
            }
        }
        for (j, var) in self.variables.iter().enumerate() {
            if let Some(lo) = var.lower {
                inequalities.push(Row {
                    coefficients: vec![(j, -1.0)],
                    rhs: -lo,
                });
            }
            if let Some(hi) = var.upper {
                inequalities.push(Row {
                    coefficients: vec![(j, 1.0)],
                    rhs: hi,
                });
            }
        }

        Ok(PopulatedProblem::new(
            self.objective.sense,
            cost,
            cost_constant,
            inequalities,
            equalities,
            self.variables.iter().map(|v| v.integer).collect(),
        ))
    }
}

/// Sparse constraint row `a . x (<=|=) rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub coefficients: Vec<(usize, f64)>,
    pub rhs: f64,
}

/// Numeric problem in canonical form for one instance
#[derive(Debug, Clone)]
pub struct PopulatedProblem {
    pub sense: ObjectiveSense,
    pub cost: Vec<f64>,
    pub cost_constant: f64,
    pub inequalities: Vec<Row>,
    pub equalities: Vec<Row>,
    pub integer: Vec<bool>,
    g: Mat<f64>,
    e: Mat<f64>,
}

fn dense(rows: &[Row], n: usize) -> Mat<f64> {
    let mut mat = Mat::<f64>::zeros(rows.len(), n);
    for (i, row) in rows.iter().enumerate() {
        for &(j, a) in &row.coefficients {
            mat[(i, j)] += a;
        }
    }
    mat
}

impl PopulatedProblem {
    pub fn new(
        sense: ObjectiveSense,
        cost: Vec<f64>,
        cost_constant: f64,
        inequalities: Vec<Row>,
        equalities: Vec<Row>,
        integer: Vec<bool>,
    ) -> Self {
        let n = cost.len();
        let g = dense(&inequalities, n);
        let e = dense(&equalities, n);
        Self {
            sense,
            cost,
            cost_constant,
            inequalities,
            equalities,
            integer,
            g,
            e,
        }
    }

    pub fn num_var(&self) -> usize {
        self.cost.len()
    }

    /// Objective value `c . x + c0`
    pub fn cost(&self, x: &[f64]) -> f64 {
        self.cost
            .iter()
            .zip(x)
            .fold(self.cost_constant, |acc, (c, v)| acc + c * v)
    }

    /// Row residuals `M x - rhs`
    fn residuals(matrix: &Mat<f64>, rows: &[Row], x: &Mat<f64>) -> Vec<f64> {
        if rows.is_empty() {
            return Vec::new();
        }
        let mx = matrix * x;
        rows.iter()
            .enumerate()
            .map(|(i, row)| mx[(i, 0)] - row.rhs)
            .collect()
    }

    fn column(x: &[f64]) -> Mat<f64> {
        Mat::from_fn(x.len(), 1, |i, _| x[i])
    }

    /// Maximum violation of the inequality, equality and integrality
    /// constraints. A point of the wrong dimension, or a row that cannot be
    /// evaluated (NaN residual), is reported with the failure sentinel.
    pub fn infeasibility(&self, x: &[f64]) -> f64 {
        if x.len() != self.num_var() || x.iter().any(|v| !v.is_finite()) {
            return FAILURE_SENTINEL;
        }
        let col = Self::column(x);

        let ineq = Self::residuals(&self.g, &self.inequalities, &col);
        let eq = Self::residuals(&self.e, &self.equalities, &col);
        // f64::max drops NaN
        if ineq.iter().chain(&eq).any(|r| r.is_nan()) {
            return FAILURE_SENTINEL;
        }

        let ineq = ineq.into_iter().fold(0.0_f64, |acc, r| acc.max(r));
        let eq = eq.into_iter().fold(0.0_f64, |acc, r| acc.max(r.abs()));
        let integrality = x
            .iter()
            .zip(&self.integer)
            .filter(|(_, &int)| int)
            .fold(0.0_f64, |acc, (v, _)| acc.max((v - v.round()).abs()));

        ineq.max(eq).max(integrality)
    }

    /// Binding pattern and integer assignment of a solved point
    pub fn extract_strategy(&self, x: &[f64]) -> Strategy {
        let col = Self::column(x);
        let binding = Self::residuals(&self.g, &self.inequalities, &col)
            .into_iter()
            .map(|r| -r <= TOL)
            .collect();
        let integers = x
            .iter()
            .zip(&self.integer)
            .filter(|(_, &int)| int)
            .map(|(v, _)| v.round() as i64)
            .collect();
        Strategy::new(binding, integers)
    }

    /// Solver model of the complete mixed-integer problem
    pub fn full_model(&self) -> LinearModel<'_> {
        LinearModel {
            sense: self.sense,
            cost: &self.cost,
            inequalities: self.inequalities.iter().collect(),
            equalities: self.equalities.iter().collect(),
            variables: self
                .integer
                .iter()
                .map(|&integer| ModelVariable {
                    lower: None,
                    upper: None,
                    integer,
                })
                .collect(),
        }
    }

    /// Continuous model with the strategy's binding rows as equalities,
    /// non-binding rows dropped and integer variables fixed.
    ///
    /// Returns `None` when the strategy does not fit this problem's shape.
    pub fn reduced_model(&self, strategy: &Strategy) -> Option<LinearModel<'_>> {
        let n_integer = self.integer.iter().filter(|&&i| i).count();
        if strategy.binding().len() != self.inequalities.len()
            || strategy.integers().len() != n_integer
        {
            return None;
        }

        let mut fixed = strategy.integers().iter();
        let variables = self
            .integer
            .iter()
            .map(|&integer| {
                if integer {
                    let value = fixed.next().copied().map(|v| v as f64);
                    ModelVariable {
                        lower: value,
                        upper: value,
                        integer: false,
                    }
                } else {
                    ModelVariable::default()
                }
            })
            .collect();

        let equalities = self
            .equalities
            .iter()
            .chain(
                self.inequalities
                    .iter()
                    .zip(strategy.binding())
                    .filter(|(_, &binding)| binding)
                    .map(|(row, _)| row),
            )
            .collect();

        Some(LinearModel {
            sense: self.sense,
            cost: &self.cost,
            inequalities: Vec::new(),
            equalities,
            variables,
        })
    }
}
