//! `bench-report`: inspect the benchmark results database.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use tabarena_bench::experiment::{ResultsStore, RunRecord, RunWithTimings, TimingRecord, TOTAL_STAGE};
use tabarena_bench::report::{self, render, Aggregation};
use tabarena_bench::settings::Settings;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect benchmark results from the SQLite database")]
struct Cli {
    /// Path to the SQLite database (overrides BENCH_DB and settings).
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    /// Settings file (defaults to ./bench.toml when present).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List benchmark runs, most recent first.
    Runs {
        /// Filter by experiment name prefix.
        #[arg(short, long)]
        experiment: Option<String>,
        /// Max rows to show.
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the results payload of a run (RUN_ID may be a prefix).
    Results {
        run_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Show the timing breakdown of a run (RUN_ID may be a prefix).
    Timings {
        run_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Show full metadata of a run (RUN_ID may be a prefix).
    Info {
        run_id: String,
        /// Only show one metadata category (system, git, ...).
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Median stage timings per (dataset, num_gpus).
    Aggregate {
        /// Filter by experiment name prefix.
        #[arg(long)]
        experiment_name: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Speedup of each GPU configuration over the num_gpus=0 baseline.
    Speedup {
        #[arg(long, value_enum, default_value_t = AggArg::Median)]
        agg: AggArg,
        /// Filter by experiment name prefix.
        #[arg(long)]
        experiment_name: Option<String>,
        /// Keep runs that had a profiler attached.
        #[arg(long)]
        include_profiled: bool,
        #[arg(long)]
        json: bool,
    },
    /// List tables and their row counts.
    Tables,
    /// Show raw rows from one table.
    Query {
        table: String,
        /// Max rows to show.
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the cProfile output path of a run (RUN_ID may be a prefix).
    ProfilePath { run_id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AggArg {
    Median,
    Min,
}

impl From<AggArg> for Aggregation {
    fn from(value: AggArg) -> Self {
        match value {
            AggArg::Median => Self::Median,
            AggArg::Min => Self::Min,
        }
    }
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

    let db_path = cli.db.clone().unwrap_or_else(|| settings.database_path());
    if !db_path.is_file() {
        bail!("Database not found: {}", db_path.display());
    }
    let store = ResultsStore::open(&db_path)
        .with_context(|| format!("Failed to open {}", db_path.display()))?;

    match cli.command {
        Command::Runs {
            experiment,
            limit,
            json,
        } => runs(&store, experiment.as_deref(), limit, json),
        Command::Results { run_id, json } => {
            let run = store.get_run(&run_id)?;
            if json {
                println!("{}", serde_json::to_string(run.results())?);
            } else {
                println!("Results for run: {}", run.run_id());
                println!("Experiment: {}", run.experiment_name());
                println!("{}", "-".repeat(60));
                println!("{}", serde_json::to_string_pretty(run.results())?);
            }
            Ok(())
        }
        Command::Timings { run_id, json } => timings(&store, &run_id, json),
        Command::Info {
            run_id,
            category,
            json,
        } => info(&store, &run_id, category.as_deref(), json),
        Command::Aggregate {
            experiment_name,
            json,
        } => {
            let runs = store.load_runs_with_timings(experiment_name.as_deref())?;
            let rows = report::aggregate(&runs, experiment_name.as_deref());
            if json {
                println!("{}", serde_json::to_string_pretty(&render::aggregate_json(&rows))?);
            } else {
                print!("{}", render::aggregate_table(&rows));
            }
            Ok(())
        }
        Command::Speedup {
            agg,
            experiment_name,
            include_profiled,
            json,
        } => {
            let runs = store.load_runs_with_timings(experiment_name.as_deref())?;
            let report = report::speedup(&runs, agg.into(), include_profiled, experiment_name.as_deref());
            if json {
                println!("{}", serde_json::to_string_pretty(&render::speedup_json(&report))?);
            } else {
                print!("{}", render::speedup_table(&report));
            }
            Ok(())
        }
        Command::Tables => {
            println!("Tables in database:");
            for (name, count) in store.table_counts()? {
                println!("  - {name} ({count} rows)");
            }
            Ok(())
        }
        Command::Query { table, limit } => query(&store, &table, limit),
        Command::ProfilePath { run_id } => profile_path(&store, &settings, &run_id),
    }
}

fn query(store: &ResultsStore, table: &str, limit: usize) -> anyhow::Result<()> {
    let result = store.query_table(table, limit)?;
    if result.rows.is_empty() {
        println!("Table '{}' is empty.", result.table);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|v| truncate(&display_value(v), 40)).collect())
        .collect();
    print!("{}", render::table(&result.columns, &rows));
    println!("\nColumns: {}", result.columns.join(", "));
    Ok(())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

fn runs(store: &ResultsStore, experiment: Option<&str>, limit: usize, json: bool) -> anyhow::Result<()> {
    let all = store.load_runs_with_timings(experiment)?;
    if all.is_empty() {
        println!("No benchmark runs found.");
        return Ok(());
    }
    let shown = &all[..all.len().min(limit)];

    if json {
        let rows: Vec<Value> = shown
            .iter()
            .map(|entry| {
                let mut row = serde_json::to_value(&entry.run)?;
                if let Value::Object(obj) = &mut row {
                    obj.insert("total_s".to_string(), json!(total_seconds(entry)));
                }
                Ok(row)
            })
            .collect::<serde_json::Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let headers: Vec<String> = [
        "run_id",
        "experiment_name",
        "created_at",
        "total_s",
        "num_gpus",
        "datasets",
        "cuda_devices",
        "profiled",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    let rows: Vec<Vec<String>> = shown
        .iter()
        .map(|entry| {
            let r = &entry.run;
            vec![
                format!("{}...", r.run_id().chars().take(12).collect::<String>()),
                r.experiment_name().to_string(),
                r.created_at().format("%Y-%m-%d %H:%M:%S").to_string(),
                total_seconds(entry).map_or_else(|| "-".to_string(), |t| format!("{t:.3}")),
                r.num_gpus().to_string(),
                r.dataset_key(),
                r.metadata()
                    .get("cuda.cuda_device_count")
                    .map_or_else(|| "-".to_string(), display_value),
                r.is_profiled().to_string(),
            ]
        })
        .collect();
    print!("{}", render::table(&headers, &rows));

    if all.len() > limit {
        println!("\n... showing {limit} of {} runs (use -n to show more)", all.len());
    }
    Ok(())
}

/// The run's `total` stage, summed if recorded more than once.
fn total_seconds(entry: &RunWithTimings) -> Option<f64> {
    let totals: Vec<f64> = entry
        .timings
        .iter()
        .filter(|t| t.stage() == TOTAL_STAGE)
        .map(TimingRecord::duration_s)
        .collect();
    (!totals.is_empty()).then(|| totals.iter().sum())
}

fn timings(store: &ResultsStore, run_id: &str, json: bool) -> anyhow::Result<()> {
    let run = store.get_run(run_id)?;
    let timings = store.get_timings(run.run_id())?;

    if json {
        let rows: Vec<Value> = timings
            .iter()
            .map(|t| {
                json!({
                    "stage": t.stage(),
                    "time_ms": t.duration_ms(),
                    "time_s": t.duration_s(),
                    "timestamp": t.recorded_at().to_rfc3339(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("Timings for run: {}", run.run_id());
    println!("Experiment: {}", run.experiment_name());
    println!("{}", "-".repeat(60));
    if timings.is_empty() {
        println!("No timings recorded.");
        return Ok(());
    }
    let headers: Vec<String> = ["stage", "time_ms", "time_s", "timestamp"]
        .iter()
        .map(ToString::to_string)
        .collect();
    let rows: Vec<Vec<String>> = timings
        .iter()
        .map(|t| {
            vec![
                t.stage().to_string(),
                format!("{:.3}", t.duration_ms()),
                format!("{:.3}", t.duration_s()),
                t.recorded_at().to_rfc3339(),
            ]
        })
        .collect();
    print!("{}", render::table(&headers, &rows));
    Ok(())
}

fn general_fields(run: &RunRecord) -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("run_id".to_string(), json!(run.run_id())),
        ("experiment_name".to_string(), json!(run.experiment_name())),
        ("experiment_id".to_string(), json!(run.experiment_id())),
        ("datasets".to_string(), json!(run.datasets())),
        ("num_gpus".to_string(), json!(run.num_gpus())),
        ("num_rows".to_string(), json!(run.num_rows())),
        ("num_cols".to_string(), json!(run.num_cols())),
        ("created_at".to_string(), json!(run.created_at().to_rfc3339())),
        ("config".to_string(), run.config().clone()),
    ])
}

fn info(store: &ResultsStore, run_id: &str, category: Option<&str>, json: bool) -> anyhow::Result<()> {
    let run = store.get_run(run_id)?;

    let mut groups: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();
    groups.insert("general".to_string(), general_fields(&run));
    for (key, value) in run.metadata() {
        match key.split_once('.') {
            Some((group, rest)) => {
                groups
                    .entry(group.to_string())
                    .or_default()
                    .insert(rest.to_string(), value.clone());
            }
            None => {
                groups
                    .entry("general".to_string())
                    .or_default()
                    .insert(key.clone(), value.clone());
            }
        }
    }
    if let Some(category) = category {
        groups.retain(|name, _| name == category || name == "general");
    }

    if json {
        let mut flat = serde_json::Map::new();
        for (group, entries) in &groups {
            for (key, value) in entries {
                let key = if group == "general" {
                    key.clone()
                } else {
                    format!("{group}.{key}")
                };
                flat.insert(key, value.clone());
            }
        }
        println!("{}", serde_json::to_string_pretty(&Value::Object(flat))?);
        return Ok(());
    }

    println!("Run ID: {}", run.run_id());
    println!("Experiment: {}", run.experiment_name());
    println!("{}", "=".repeat(60));
    for (group, entries) in &groups {
        println!("\n[{group}]");
        for (key, value) in entries {
            println!("  {key}: {}", truncate(&display_value(value), 100));
        }
    }
    Ok(())
}

fn profile_path(store: &ResultsStore, settings: &Settings, run_id: &str) -> anyhow::Result<()> {
    let run = store.get_run(run_id)?;
    let Some(experiment_id) = run.experiment_id() else {
        bail!("No experiment_id found for run '{}'", run.run_id());
    };
    let Some(dataset) = run.datasets().first() else {
        bail!("No datasets found for run '{}'", run.run_id());
    };

    let path: PathBuf = settings
        .paths
        .profiles_dir
        .join(experiment_id)
        .join(format!("{dataset}.prof"));
    println!("{}", path.display());
    if !Path::new(&path).is_file() {
        bail!("Profile not found: {}", path.display());
    }
    Ok(())
}
