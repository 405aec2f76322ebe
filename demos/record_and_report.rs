//! Record and Report Example
//!
//! Simulates what the benchmark program does for one experiment: one CPU
//! baseline and two GPU runs per dataset are timed and saved, then the
//! reporter's aggregation and speedup views are printed.
//!
//! Run with: cargo run --example record_and_report

use std::time::Duration;

use tabarena_bench::experiment::{BenchmarkTimer, ResultsStore};
use tabarena_bench::report::{self, render, Aggregation};

fn main() -> tabarena_bench::Result<()> {
    println!("=== TabArena Bench: Record and Report ===\n");

    let mut store = ResultsStore::open_in_memory()?;
    let experiment_id = "6f1c2d3e4b5a69788796a5b4c3d2e1f0";

    // -------------------------------------------------------------------------
    // 1. Record runs (what the benchmark program does per dataset)
    // -------------------------------------------------------------------------
    println!("1. Recording runs...");

    let fits: [(&str, u32, f64); 6] = [
        ("anneal", 0, 3.2),
        ("anneal", 1, 2.6),
        ("anneal", 1, 2.5),
        ("diabetes", 0, 1.8),
        ("diabetes", 1, 0.9),
        ("diabetes", 2, 0.6),
    ];

    for (dataset, num_gpus, fit_s) in fits {
        let mut timer = BenchmarkTimer::new(format!("{experiment_id}_{dataset}"));
        timer.record("load_data", Duration::from_millis(120));
        timer.record("fit", Duration::from_secs_f64(fit_s));
        timer.record("predict", Duration::from_secs_f64(fit_s / 10.0));

        let run = timer
            .run_builder(std::path::Path::new("."))
            .datasets([dataset])
            .num_gpus(num_gpus)
            .config(serde_json::json!({ "model": "RandomForest", "n_estimators": 300 }))
            .results(serde_json::json!({ "accuracy": 0.91 }))
            .build();

        println!("   {} num_gpus={num_gpus}", run.run_id());
        print!("{}", indent(&timer.summary()));
        timer.save(&mut store, &run)?;
    }

    // -------------------------------------------------------------------------
    // 2. Browse what was stored
    // -------------------------------------------------------------------------
    println!("\n2. Tables:");
    for (table, count) in store.table_counts()? {
        println!("   {table}: {count} rows");
    }

    let runs = store.load_runs_with_timings(Some(experiment_id))?;
    println!("   {} runs for experiment {experiment_id}", runs.len());

    // -------------------------------------------------------------------------
    // 3. Median stage timings per (dataset, num_gpus)
    // -------------------------------------------------------------------------
    println!("\n3. Aggregate:");
    print!("{}", indent(&render::aggregate_table(&report::aggregate(&runs, None))));

    // -------------------------------------------------------------------------
    // 4. Speedup vs CPU baseline
    // -------------------------------------------------------------------------
    println!("\n4. Speedup:");
    let speedups = report::speedup(&runs, Aggregation::Median, false, None);
    print!("{}", indent(&render::speedup_table(&speedups)));

    if let Some(row) = speedups.row("anneal", 1) {
        println!("\n   anneal fit speedup on 1 GPU: {:.2}x", row.speedups["fit"]);
    }

    println!("\n=== Done ===");
    Ok(())
}

fn indent(text: &str) -> String {
    text.lines().map(|l| format!("   {l}\n")).collect()
}
