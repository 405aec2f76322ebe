//! Benchmark results schema and store
//!
//! ```text
//! RunRecord (1) ──< TimingRecord (N)   [benchmark_runs / benchmark_timings]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use tabarena_bench::experiment::{BenchmarkTimer, ResultsStore};
//!
//! let mut store = ResultsStore::open_in_memory()?;
//!
//! // The benchmark program times its stages...
//! let mut timer = BenchmarkTimer::new("d5c9b4244ef14e0480a3c6815c08e803_anneal");
//! timer.record("train", Duration::from_millis(3200));
//!
//! // ...and persists one run with its timings.
//! let run = timer
//!     .run_builder(std::path::Path::new("."))
//!     .datasets(["anneal"])
//!     .num_gpus(0)
//!     .build();
//! let run_id = run.run_id().to_string();
//! timer.save(&mut store, &run)?;
//!
//! let found = store.get_run(&run_id[..8])?;
//! assert_eq!(found.experiment_name(), "d5c9b4244ef14e0480a3c6815c08e803_anneal");
//! # Ok::<(), tabarena_bench::Error>(())
//! ```

mod environment;
mod run_record;
mod store;
mod timer;
mod timing_record;

pub use environment::{collect_metadata, MetadataCollector};
pub use run_record::{RunRecord, RunRecordBuilder, PROFILING_METADATA_KEYS};
pub use store::{ResultsStore, RunWithTimings, TableRows, DEFAULT_DB_NAME, RUNS_TABLE, TIMINGS_TABLE};
pub use timer::BenchmarkTimer;
pub use timing_record::{TimingRecord, TOTAL_STAGE};
