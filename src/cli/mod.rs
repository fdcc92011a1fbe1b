//! CLI module - argument parsing and command execution

mod args;
mod commands;

pub use args::{Cli, Commands, RunArgs};
pub use commands::run;
