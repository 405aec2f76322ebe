//! Experiment-run orchestration
//!
//! ```text
//! RunConfig::resolve ──> for each Dataset:
//!                          BenchCommand::compose
//!                            └─> RunExecutor::execute   (tee to results/{id}/{dataset}_output.txt)
//!                                  └─> extract_results  (results/{id}/{dataset}_results.txt)
//!                                        └─> Workspace::clean
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tabarena_bench::run::{Orchestrator, RunConfig};
//! use tabarena_bench::settings::Settings;
//!
//! let settings = Settings::default();
//! let config = RunConfig::resolve(false, true, None, Some(1))?;
//! let outcomes = Orchestrator::new(&settings, &config)?.run_all(&settings.benchmark.datasets);
//! for outcome in &outcomes {
//!     println!("{}: {:?}", outcome.dataset, outcome.status);
//! }
//! # Ok::<(), tabarena_bench::Error>(())
//! ```

mod command;
mod config;
mod dataset;
mod executor;
mod extract;
mod layout;
mod orchestrator;
mod workspace;

pub use command::{BenchCommand, CPROFILE_METADATA, CUML_PROFILE_METADATA};
pub use config::{ExperimentId, ProfilingMode, RunConfig};
pub use dataset::Dataset;
pub use executor::{RunExecutor, RunOutcome};
pub use extract::{extract_results, find_results_section, Extraction, RESULTS_MARKER};
pub use layout::DatasetRun;
pub use orchestrator::{DatasetOutcome, DatasetStatus, Orchestrator};
pub use workspace::Workspace;
