//! Strategies and their integer encoding
//!
//! A strategy is the combinatorial fingerprint of one optimal solution:
//! which canonical inequality rows are binding and which value every integer
//! variable takes. Training strategies are collapsed into a table of unique
//! strategies whose positions are the class labels seen by the learner.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{OptimizerError, Result};

/// Binding pattern plus integer assignment of one solved instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Strategy {
    binding: Vec<bool>,
    integers: Vec<i64>,
}

impl Strategy {
    pub fn new(binding: Vec<bool>, integers: Vec<i64>) -> Self {
        Self { binding, integers }
    }

    /// One flag per canonical inequality row
    pub fn binding(&self) -> &[bool] {
        &self.binding
    }

    /// One value per integer variable, in variable order
    pub fn integers(&self) -> &[i64] {
        &self.integers
    }

    pub fn n_binding(&self) -> usize {
        self.binding.iter().filter(|&&b| b).count()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active: Vec<String> = self
            .binding
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(i, _)| i.to_string())
            .collect();
        let ints: Vec<String> = self.integers.iter().map(|v| v.to_string()).collect();
        write!(f, "binding=[{}] integers=[{}]", active.join(","), ints.join(","))
    }
}

/// Label to strategy lookup built from training strategies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyTable {
    strategies: Vec<Strategy>,
}

impl StrategyTable {
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Strategy for a label; unknown labels mean training and inference
    /// state disagree.
    pub fn decode(&self, label: usize) -> Result<&Strategy> {
        self.strategies
            .get(label)
            .ok_or(OptimizerError::UnknownLabel {
                label,
                len: self.strategies.len(),
            })
    }

    pub fn label_of(&self, strategy: &Strategy) -> Option<usize> {
        self.strategies.iter().position(|s| s == strategy)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Strategy)> {
        self.strategies.iter().enumerate()
    }
}

/// Assign labels in first-seen order.
///
/// Returns one label per input strategy and the table of unique strategies.
pub fn encode_strategies(strategies: &[Strategy]) -> (Vec<usize>, StrategyTable) {
    let mut seen: HashMap<&Strategy, usize> = HashMap::new();
    let mut table = StrategyTable::default();

    let labels = strategies
        .iter()
        .map(|s| {
            *seen.entry(s).or_insert_with(|| {
                table.strategies.push(s.clone());
                table.strategies.len() - 1
            })
        })
        .collect();

    (labels, table)
}
