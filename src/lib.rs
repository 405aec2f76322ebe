//! # tabarena-bench: GPU vs CPU benchmark orchestration
//!
//! Runs a fixed TabArena Random Forest benchmark over a list of datasets,
//! optionally under cProfile and/or cuML accelerator profiling, captures
//! each run's console output, and reports CPU-vs-GPU speedups from the
//! SQLite results store the benchmark program writes into.
//!
//! ## Modules
//!
//! - [`run`]: flags → [`run::RunConfig`] → per-dataset compose / execute / extract / clean
//! - [`experiment`]: [`experiment::RunRecord`] / [`experiment::TimingRecord`] schema and the SQLite store
//! - [`report`]: grouped medians and speedup ratios
//! - [`settings`]: TOML configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use tabarena_bench::run::{Orchestrator, RunConfig};
//! use tabarena_bench::settings::Settings;
//!
//! let settings = Settings::load(None)?;
//! let config = RunConfig::resolve(false, false, None, Some(0))?;
//! let outcomes = Orchestrator::new(&settings, &config)?.run_all(&settings.benchmark.datasets);
//! println!("{} of {} datasets produced results",
//!     outcomes.iter().filter(|o| o.is_completed()).count(), outcomes.len());
//! # Ok::<(), tabarena_bench::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod error;
pub mod experiment;
pub mod logging;
pub mod report;
pub mod run;
pub mod settings;

pub use error::{Error, Result};
