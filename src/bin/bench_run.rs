//! `bench-run`: run the TabArena benchmark over every configured dataset.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tabarena_bench::run::{Dataset, DatasetStatus, Orchestrator, RunConfig};
use tabarena_bench::settings::Settings;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run the cuML/TabArena Random Forest benchmark over a fixed dataset list")]
struct Cli {
    /// Enable cuML accelerator profiling (needs GPU acceleration).
    #[arg(long)]
    cuml_profile: bool,

    /// Wrap each run in cProfile, writing cprofiles/{experiment_id}/{dataset}.prof.
    #[arg(long)]
    cprofile: bool,

    /// Reuse an experiment ID instead of generating one.
    #[arg(long, value_name = "ID")]
    experiment_id: Option<String>,

    /// GPU count passed to the benchmark; 0 disables the cuML accelerator.
    #[arg(long, value_name = "N")]
    num_gpus: Option<u32>,

    /// Settings file (defaults to ./bench.toml when present).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Only run these datasets (repeatable).
    #[arg(long = "dataset", value_name = "NAME")]
    datasets: Vec<Dataset>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    tabarena_bench::logging::init(&settings.logging);

    let config = RunConfig::resolve(cli.cuml_profile, cli.cprofile, cli.experiment_id, cli.num_gpus)?;

    let datasets: Vec<Dataset> = if cli.datasets.is_empty() {
        settings.benchmark.datasets.clone()
    } else {
        Dataset::ALL
            .into_iter()
            .filter(|d| cli.datasets.contains(d))
            .collect()
    };

    println!("Experiment ID: {}", config.experiment_id());
    let outcomes = Orchestrator::new(&settings, &config)?.run_all(&datasets);

    println!("\nSummary for experiment {}:", config.experiment_id());
    for outcome in &outcomes {
        let line = match &outcome.status {
            DatasetStatus::Completed { results_file, .. } => {
                format!("ok       {}", results_file.display())
            }
            DatasetStatus::MissingResults { exit_code } => format!(
                "warning  no results (exit code {}); see {}",
                exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string()),
                outcome.output_file.display()
            ),
            DatasetStatus::Failed { error } => format!("failed   {error}"),
        };
        println!("  {:<34} {line}", outcome.dataset.name());
    }

    let completed = outcomes.iter().filter(|o| o.is_completed()).count();
    info!(completed, total = outcomes.len(), "benchmark finished");
    Ok(())
}
