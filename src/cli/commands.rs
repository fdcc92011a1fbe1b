//! Command implementations for `train`, `evaluate` and `solve`

use std::fs::File;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::pipeline::{
    load_instances, save_training_data, HighsSolver, Instance, Learner, LearnerConfig, Model,
    Optimizer, ProblemTemplate, TrainedOptimizer,
};
use crate::report::{display_performance, export_performance_csv, export_performance_json, ExportParams};
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config, print_count,
    print_info, print_input, print_saved, print_step_header, print_step_time, print_success,
};

use super::args::{Commands, RunArgs};

/// Dispatch a parsed command
pub fn run(command: &Commands) -> Result<()> {
    print_banner(env!("CARGO_PKG_VERSION"));

    match command {
        Commands::Train {
            problem,
            data,
            output,
            overwrite,
            save_data,
            run,
            ..
        } => {
            let config = command
                .learner_config()
                .context("Train command carries no learner configuration")?;
            run_train(&TrainJob {
                problem,
                data,
                output,
                overwrite: *overwrite,
                save_data: save_data.as_deref(),
                config,
                run,
            })
        }
        Commands::Evaluate {
            model,
            data,
            output_dir,
            json,
            run,
        } => run_evaluate(model, data, output_dir.as_deref(), json.as_deref(), run),
        Commands::Solve {
            model,
            data,
            output,
            run,
        } => run_solve(model, data, output, run),
    }
}

struct TrainJob<'a> {
    problem: &'a Path,
    data: &'a Path,
    output: &'a Path,
    overwrite: bool,
    save_data: Option<&'a Path>,
    config: LearnerConfig,
    run: &'a RunArgs,
}

fn load_rows(data: &Path, problem: &ProblemTemplate, run: &RunArgs) -> Result<Vec<Instance>> {
    let step_start = Instant::now();
    let spinner = create_spinner("Loading parameter table...");
    let instances = load_instances(data, problem, run.infer_schema_length)
        .with_context(|| format!("Failed to load instances from {}", data.display()))?;
    finish_with_success(&spinner, "Parameter table loaded");
    print_count("instance(s)", instances.len(), None);
    print_step_time(step_start.elapsed());
    Ok(instances)
}

fn load_model(model: &Path) -> Result<TrainedOptimizer<Model>> {
    TrainedOptimizer::load(model)
        .with_context(|| format!("Failed to load trained optimizer from {}", model.display()))
}

fn run_train(job: &TrainJob) -> Result<()> {
    print_config(
        "Training",
        &[
            ("Problem", job.problem.display().to_string()),
            ("Data", job.data.display().to_string()),
            ("Output", job.output.display().to_string()),
            ("Learner", job.config.kind.to_string()),
            ("n_best", job.config.n_best.to_string()),
            ("Execution", format!("{:?}", job.run.execution())),
        ],
    );

    print_step_header(1, "Load Inputs");
    let problem = ProblemTemplate::from_json_file(job.problem)
        .with_context(|| format!("Failed to read problem template {}", job.problem.display()))?;
    print_success(&format!(
        "Problem '{}': {} variable(s), {} constraint row(s), {} parameter value(s)",
        problem.name,
        problem.num_var(),
        problem.num_constraints(),
        problem.n_features()
    ));
    let instances = load_rows(job.data, &problem, job.run)?;

    print_step_header(2, "Compute Strategies");
    let step_start = Instant::now();
    let optimizer = Optimizer::new(problem)?;
    let solver = HighsSolver::new(job.run.solver_config());
    let data = optimizer.encode_training_set(&instances, &solver, job.run.execution())?;
    print_count(
        "distinct strateg(ies)",
        data.table.len(),
        Some(&format!("over {} instance(s)", data.labels.len())),
    );
    if let Some(path) = job.save_data {
        save_training_data(&data, path)
            .with_context(|| format!("Failed to save training data to {}", path.display()))?;
        print_saved(path);
    }
    print_step_time(step_start.elapsed());

    print_step_header(3, "Train Learner");
    let step_start = Instant::now();
    let trained = optimizer.train_with_data(&data, Model::from_config(&job.config))?;
    print_success(&format!(
        "{} learner trained on {} instance(s)",
        trained.learner().kind(),
        trained.learner().n_train()
    ));
    print_step_time(step_start.elapsed());

    print_step_header(4, "Save Optimizer");
    trained
        .save(job.output, job.overwrite)
        .with_context(|| format!("Failed to save optimizer to {}", job.output.display()))?;
    print_saved(job.output);

    print_completion("Training");
    Ok(())
}

fn run_evaluate(
    model: &Path,
    data: &Path,
    output_dir: Option<&Path>,
    json: Option<&Path>,
    run: &RunArgs,
) -> Result<()> {
    print_step_header(1, "Load Inputs");
    let trained = load_model(model)?;
    print_input(model);
    let instances = load_rows(data, trained.problem(), run)?;

    print_step_header(2, "Evaluate");
    let step_start = Instant::now();
    let solver = HighsSolver::new(run.solver_config());
    let (summary, details) = trained.performance(&instances, &solver, run.execution())?;
    print_step_time(step_start.elapsed());
    display_performance(&summary);

    if output_dir.is_some() || json.is_some() {
        print_step_header(3, "Export Results");
    }
    if let Some(dir) = output_dir {
        let (general, detail) = export_performance_csv(&summary, &details, dir)?;
        print_saved(&general);
        print_saved(&detail);
    }
    if let Some(path) = json {
        let params = ExportParams {
            model,
            input_file: data,
            learner: trained.learner().kind(),
        };
        export_performance_json(&summary, &details, path, &params)?;
        print_saved(path);
    }

    print_completion("Evaluation");
    Ok(())
}

fn run_solve(model: &Path, data: &Path, output: &Path, run: &RunArgs) -> Result<()> {
    print_step_header(1, "Load Inputs");
    let trained = load_model(model)?;
    print_input(model);
    let instances = load_rows(data, trained.problem(), run)?;

    print_step_header(2, "Predict Solutions");
    let step_start = Instant::now();
    let solver = HighsSolver::new(run.solver_config());
    let results = trained.solve(&instances, &solver, run.execution())?;
    let infeasible = results.iter().filter(|r| !r.is_feasible()).count();
    if infeasible > 0 {
        print_count("infeasible prediction(s)", infeasible, None);
    } else {
        print_info("All predictions are feasible");
    }
    print_step_time(step_start.elapsed());

    print_step_header(3, "Save Results");
    let labels: Vec<Option<u64>> = results
        .iter()
        .map(|r| {
            r.strategy
                .as_ref()
                .and_then(|s| trained.table().label_of(s))
                .map(|l| l as u64)
        })
        .collect();
    let mut df = df! {
        "instance" => (0..results.len() as u64).collect::<Vec<_>>(),
        "cost" => results.iter().map(|r| r.cost).collect::<Vec<_>>(),
        "infeasibility" => results.iter().map(|r| r.infeasibility).collect::<Vec<_>>(),
        "time" => results.iter().map(|r| r.time).collect::<Vec<_>>(),
        "strategy" => labels,
    }?;

    let mut file = File::create(output)
        .with_context(|| format!("Failed to create output file: {}", output.display()))?;
    CsvWriter::new(&mut file)
        .finish(&mut df)
        .with_context(|| format!("Failed to write CSV file: {}", output.display()))?;
    print_saved(output);

    print_completion("Solve");
    Ok(())
}
