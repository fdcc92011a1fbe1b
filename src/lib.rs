//! stratlearn: Learning Optimal Strategies Library
//!
//! Solves a parametric mixed-integer linear program over a training set,
//! encodes each optimal solution as a strategy (binding constraints plus
//! integer values) and trains a classifier that proposes strategies for new
//! parameters. A proposed strategy reduces the problem to a continuous
//! solve whose point is verified against the full problem.

pub mod cli;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod utils;

pub use error::{OptimizerError, Result};
