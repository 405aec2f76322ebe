//! The per-dataset loop: compose, execute, extract, clean.
//!
//! Datasets run sequentially in list order. A failure inside one dataset
//! is logged and recorded in its [`DatasetOutcome`]; the loop always moves
//! on to the next dataset.

use std::path::{Path, PathBuf};

use tracing::{error, info, info_span, warn};

use super::{extract_results, BenchCommand, Dataset, DatasetRun, Extraction, RunConfig, RunExecutor, Workspace};
use crate::settings::{PathSettings, Settings};
use crate::Result;

/// How a single dataset run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetStatus {
    /// Output contained the results marker and a results file was written.
    Completed {
        /// Exit code of the benchmark process.
        exit_code: Option<i32>,
        /// Extracted results section.
        results_file: PathBuf,
    },
    /// The process ran but printed no results section.
    MissingResults {
        /// Exit code of the benchmark process.
        exit_code: Option<i32>,
    },
    /// The run could not be carried out (spawn or filesystem error).
    Failed {
        /// Rendered error.
        error: String,
    },
}

/// Summary of one dataset iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetOutcome {
    /// The dataset.
    pub dataset: Dataset,
    /// `{experiment_id}_{dataset}`.
    pub experiment_name: String,
    /// Captured console output.
    pub output_file: PathBuf,
    /// Result of the iteration.
    pub status: DatasetStatus,
}

impl DatasetOutcome {
    /// Whether a results file was produced.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.status, DatasetStatus::Completed { .. })
    }
}

/// Drives the benchmark program over a list of datasets.
#[derive(Debug)]
pub struct Orchestrator<'a> {
    settings: &'a Settings,
    config: &'a RunConfig,
    executor: RunExecutor,
    cwd: PathBuf,
    paths: PathSettings,
}

impl<'a> Orchestrator<'a> {
    /// Orchestrator rooted at the process working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be determined.
    pub fn new(settings: &'a Settings, config: &'a RunConfig) -> Result<Self> {
        Ok(Self::with_working_dir(settings, config, std::env::current_dir()?))
    }

    /// Orchestrator rooted at `cwd`. Relative settings paths resolve against it.
    #[must_use]
    pub fn with_working_dir(settings: &'a Settings, config: &'a RunConfig, cwd: PathBuf) -> Self {
        // The child may run in a per-run workspace, so every path it sees is absolute.
        let paths = PathSettings {
            results_dir: cwd.join(&settings.paths.results_dir),
            profiles_dir: cwd.join(&settings.paths.profiles_dir),
            database: cwd.join(&settings.paths.database),
        };
        Self {
            settings,
            config,
            executor: RunExecutor::new(),
            cwd,
            paths,
        }
    }

    /// Replace the executor (e.g. to silence the terminal copy).
    #[must_use]
    pub const fn executor(mut self, executor: RunExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Absolute output layout for `dataset`.
    #[must_use]
    pub fn dataset_run(&self, dataset: Dataset) -> DatasetRun {
        DatasetRun::new(self.config, dataset, &self.paths)
    }

    /// The benchmark command for `run`.
    #[must_use]
    pub fn command(&self, run: &DatasetRun) -> BenchCommand {
        BenchCommand::compose(&self.python(), &self.script(), self.config, run)
    }

    fn script(&self) -> PathBuf {
        self.cwd.join(&self.settings.benchmark.script)
    }

    /// Workspace for `run`; transient directories next to the script are cleaned too.
    #[must_use]
    pub fn workspace(&self, run: &DatasetRun) -> Workspace {
        let workspace =
            Workspace::from_settings(&self.settings.workspace, &self.cwd, run.experiment_name());
        let script = self.script();
        match script.parent() {
            Some(script_dir) => workspace.also_clean_under(script_dir),
            None => workspace,
        }
    }

    fn python(&self) -> PathBuf {
        let python = &self.settings.benchmark.python;
        // A bare name is looked up on PATH; anything with a separator is a path.
        if python.components().count() > 1 {
            self.cwd.join(python)
        } else {
            python.clone()
        }
    }

    /// Run every dataset in order, never stopping early.
    pub fn run_all(&self, datasets: &[Dataset]) -> Vec<DatasetOutcome> {
        info!(
            experiment_id = %self.config.experiment_id(),
            profiling = ?self.config.profiling(),
            num_gpus = ?self.config.num_gpus(),
            datasets = datasets.len(),
            "starting benchmark"
        );
        datasets.iter().map(|&d| self.run_dataset(d)).collect()
    }

    /// Run one dataset: compose, execute, extract, clean.
    pub fn run_dataset(&self, dataset: Dataset) -> DatasetOutcome {
        let run = self.dataset_run(dataset);
        let _span = info_span!("dataset", name = %dataset).entered();
        info!(experiment_name = run.experiment_name(), "running dataset");

        let workspace = self.workspace(&run);

        let status = match self.execute_and_extract(&run, &workspace) {
            Ok(status) => status,
            Err(e) => {
                error!(error = %e, "dataset run failed");
                DatasetStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        if let Err(e) = workspace.clean() {
            warn!(error = %e, workspace = %workspace.dir().display(), "workspace cleanup failed");
        }

        DatasetOutcome {
            dataset,
            experiment_name: run.experiment_name().to_string(),
            output_file: run.output_file().to_path_buf(),
            status,
        }
    }

    fn execute_and_extract(&self, run: &DatasetRun, workspace: &Workspace) -> Result<DatasetStatus> {
        workspace.prepare()?;
        if let Some(parent) = run.profile_file().and_then(Path::parent) {
            std::fs::create_dir_all(parent)?;
        }

        let command = self.command(run);
        let outcome = self
            .executor
            .execute(&command, workspace.dir(), run.output_file())?;

        Ok(
            match extract_results(run.output_file(), run.results_file())? {
                Extraction::Extracted { results_file, .. } => DatasetStatus::Completed {
                    exit_code: outcome.exit_code(),
                    results_file,
                },
                Extraction::MissingMarker => DatasetStatus::MissingResults {
                    exit_code: outcome.exit_code(),
                },
            },
        )
    }
}
