//! Error types for tabarena-bench
//!
//! Clear error messages with actionable guidance: every variant says what
//! went wrong and, where there is one, what to do about it.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// tabarena-bench error types
#[derive(Error, Debug)]
pub enum Error {
    /// Incompatible command-line flags (fatal, raised before any dataset runs)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A run ID prefix matched more than one run
    #[error("Multiple runs match '{prefix}'. Please be more specific:\n{}", format_matches(.matches))]
    AmbiguousPrefix {
        /// The prefix that was looked up
        prefix: String,
        /// Full run IDs that share the prefix
        matches: Vec<String>,
    },

    /// No run ID starts with the given prefix
    #[error("No run found with run_id starting with '{0}'")]
    NotFound(String),

    /// A table name that is not in the database
    #[error("No table named '{0}' in database (see the `tables` command)")]
    UnknownTable(String),

    /// Speedup requested for a dataset that has no `num_gpus = 0` baseline
    #[error("Insufficient data for dataset '{dataset}': no num_gpus=0 baseline run")]
    InsufficientData {
        /// Dataset key (comma-joined dataset names)
        dataset: String,
    },

    /// Settings file could not be parsed
    #[error("Settings error: {0}")]
    Settings(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON (de)serialization error for persisted payloads
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

fn format_matches(matches: &[String]) -> String {
    matches
        .iter()
        .map(|m| format!("  - {m}"))
        .collect::<Vec<_>>()
        .join("\n")
}
