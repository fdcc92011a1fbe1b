//! stratlearn: Strategy Learning CLI Tool
//!
//! Trains, evaluates and applies learned optimizers for parametric
//! mixed-integer linear programs.

use anyhow::Result;
use clap::Parser;

use stratlearn::cli::{self, Cli};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    cli::run(&cli.command)
}
