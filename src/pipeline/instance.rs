//! Parameter instances - one row of a parameter table

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{OptimizerError, Result};

use super::problem::ProblemTemplate;

/// A single parameter assignment.
///
/// Values are stored by parameter name. Scalars are vectors of length one,
/// matrices are flattened row-major.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    values: BTreeMap<String, Vec<f64>>,
}

impl Instance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert(name, values);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.values.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.values.get(name).map(|v| v.as_slice())
    }

    /// Look up a parameter and check its size against the declaration.
    /// NaN or infinite values are rejected.
    pub fn require(&self, name: &str, expected: usize) -> Result<&[f64]> {
        let values = self
            .get(name)
            .ok_or_else(|| OptimizerError::MissingParameter {
                name: name.to_string(),
            })?;
        if values.len() != expected {
            return Err(OptimizerError::ParameterSize {
                name: name.to_string(),
                expected,
                found: values.len(),
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(OptimizerError::NonFiniteParameter {
                name: name.to_string(),
                index,
            });
        }
        Ok(values)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    /// Feature vector for the learner: the problem's parameters concatenated
    /// in declaration order.
    pub fn features(&self, problem: &ProblemTemplate) -> Result<Vec<f64>> {
        let mut features = Vec::with_capacity(problem.n_features());
        for param in &problem.parameters {
            features.extend_from_slice(self.require(&param.name, param.size)?);
        }
        Ok(features)
    }
}

/// Build the feature matrix for a batch of instances
pub fn feature_matrix(problem: &ProblemTemplate, instances: &[Instance]) -> Result<Vec<Vec<f64>>> {
    instances.iter().map(|i| i.features(problem)).collect()
}
