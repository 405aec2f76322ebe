//! Harness settings loaded from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration that matches the layout the benchmark scripts
//! have always used.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::experiment::DEFAULT_DB_NAME;
use crate::run::Dataset;
use crate::Result;

/// Settings file looked up in the working directory when `--config` is absent.
pub const DEFAULT_SETTINGS_FILE: &str = "bench.toml";

/// Environment variable overriding `paths.database`.
pub const DATABASE_ENV_VAR: &str = "BENCH_DB";

/// Top-level harness settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// What to run.
    pub benchmark: BenchmarkSettings,
    /// Where outputs go.
    pub paths: PathSettings,
    /// Transient workspace policy.
    pub workspace: WorkspaceSettings,
    /// Log filter and format.
    pub logging: LoggingSettings,
}

/// The external benchmark program and the datasets it is run on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkSettings {
    /// Python interpreter used to launch the benchmark script.
    pub python: PathBuf,
    /// Benchmark entry point.
    pub script: PathBuf,
    /// Datasets to loop over, in order.
    pub datasets: Vec<Dataset>,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            python: PathBuf::from("python"),
            script: PathBuf::from("run_quickstart_tabarena_cuml.py"),
            datasets: Dataset::ALL.to_vec(),
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Root of `{experiment_id}/{dataset}_output.txt` and `_results.txt`.
    pub results_dir: PathBuf,
    /// Root of `{experiment_id}/{dataset}.prof`.
    pub profiles_dir: PathBuf,
    /// SQLite results database.
    pub database: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            profiles_dir: PathBuf::from("cprofiles"),
            database: PathBuf::from(DEFAULT_DB_NAME),
        }
    }
}

/// Where the benchmark program runs and what it leaves behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    /// Parent of per-run workspaces.
    pub root: PathBuf,
    /// Give every dataset run its own working directory.
    ///
    /// When false, transient directories are removed from the process
    /// working directory, which races if two invocations share it.
    pub scope_per_run: bool,
    /// Directories the benchmark program creates and that are removed after each run.
    pub transient_dirs: Vec<PathBuf>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("workspaces"),
            scope_per_run: true,
            transient_dirs: vec![
                PathBuf::from("AutogluonModels"),
                PathBuf::from("experiments"),
            ],
        }
    }
}

/// Log output configuration. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, e.g. `info` or `tabarena_bench=debug`.
    pub level: String,
    /// One of `full`, `compact`, `pretty`.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
        }
    }
}

/// Formatter used by the binaries' `tracing-subscriber`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line records with timestamps and targets.
    #[default]
    Full,
    /// Abbreviated single-line records.
    Compact,
    /// Multi-line human-oriented records.
    Pretty,
}

impl Settings {
    /// Parse settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Settings` if the text is not valid TOML or names an
    /// unknown dataset.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load settings from `path`, or from [`DEFAULT_SETTINGS_FILE`] if it
    /// exists, or fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file cannot be read, or if
    /// any settings file that is read fails to parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?),
            None => {
                let default = Path::new(DEFAULT_SETTINGS_FILE);
                if default.is_file() {
                    Self::from_toml(&std::fs::read_to_string(default)?)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Database path after applying the [`DATABASE_ENV_VAR`] override.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        std::env::var_os(DATABASE_ENV_VAR)
            .map_or_else(|| self.paths.database.clone(), PathBuf::from)
    }
}
