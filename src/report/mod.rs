//! Aggregation and speedup reporting over stored runs
//!
//! All functions are pure over a slice of [`RunWithTimings`], so the
//! reporter loads once from the [`ResultsStore`] and computes in memory.
//!
//! ## Usage
//!
//! ```rust
//! use tabarena_bench::experiment::{ResultsStore, RunRecord, TimingRecord};
//! use tabarena_bench::report::{speedup, Aggregation};
//!
//! let mut store = ResultsStore::open_in_memory()?;
//! for (id, gpus, train) in [("cpu0", 0, 3.2), ("gpu1", 1, 2.6)] {
//!     let run = RunRecord::builder(id, format!("exp_{id}")).datasets(["anneal"]).num_gpus(gpus).build();
//!     store.save_experiment_results(&run, &[TimingRecord::new(id, "train", train)])?;
//! }
//!
//! let runs = store.load_runs_with_timings(None)?;
//! let report = speedup(&runs, Aggregation::Median, false, None);
//! let row = report.row("anneal", 1).unwrap();
//! assert!((row.speedups["train"] - 3.2 / 2.6).abs() < 1e-9);
//! # Ok::<(), tabarena_bench::Error>(())
//! ```
//!
//! [`RunWithTimings`]: crate::experiment::RunWithTimings
//! [`ResultsStore`]: crate::experiment::ResultsStore

mod aggregate;
pub mod render;
mod speedup;
mod stats;

pub use aggregate::{aggregate, aggregate_by, AggregateRow, RunFilter};
pub use speedup::{dataset_speedups, speedup, SpeedupReport, SpeedupRow};
pub use stats::{median, Aggregation};
