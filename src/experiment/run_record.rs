//! Run Record - one benchmark program execution on one dataset

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata keys that mark a run as profiled.
pub const PROFILING_METADATA_KEYS: [&str; 2] = ["cprofile", "cuml_accel_profile"];

/// Run Record represents a single benchmark run as persisted in `benchmark_runs`.
///
/// Runs are append-only: once saved, a record is never modified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    run_id: String,
    experiment_name: String,
    datasets: Vec<String>,
    num_gpus: u32,
    num_rows: Option<u64>,
    num_cols: Option<u64>,
    config: serde_json::Value,
    metadata: BTreeMap<String, serde_json::Value>,
    results: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl RunRecord {
    /// Create a new run record with a fresh run ID and the current timestamp.
    ///
    /// # Arguments
    ///
    /// * `experiment_name` - `{experiment_id}_{dataset}` as passed to the benchmark program
    /// * `num_gpus` - GPU count the run used (0 is the CPU baseline)
    #[must_use]
    pub fn new(experiment_name: impl Into<String>, num_gpus: u32) -> Self {
        RunRecordBuilder::new(Uuid::new_v4().simple().to_string(), experiment_name)
            .num_gpus(num_gpus)
            .build()
    }

    /// Create a builder for constructing a run record with optional fields.
    #[must_use]
    pub fn builder(
        run_id: impl Into<String>,
        experiment_name: impl Into<String>,
    ) -> RunRecordBuilder {
        RunRecordBuilder::new(run_id, experiment_name)
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn experiment_name(&self) -> &str {
        &self.experiment_name
    }

    /// Get the dataset names.
    #[must_use]
    pub fn datasets(&self) -> &[String] {
        &self.datasets
    }

    /// Datasets joined with `,`, used as the grouping key in reports.
    #[must_use]
    pub fn dataset_key(&self) -> String {
        self.datasets.join(",")
    }

    /// Get the GPU count.
    #[must_use]
    pub const fn num_gpus(&self) -> u32 {
        self.num_gpus
    }

    /// Get the dataset row count, if known.
    #[must_use]
    pub const fn num_rows(&self) -> Option<u64> {
        self.num_rows
    }

    /// Get the dataset column count, if known.
    #[must_use]
    pub const fn num_cols(&self) -> Option<u64> {
        self.num_cols
    }

    /// Get the serialized run configuration.
    #[must_use]
    pub const fn config(&self) -> &serde_json::Value {
        &self.config
    }

    /// Get the metadata map (profiling flags, environment).
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    /// Get the results payload.
    #[must_use]
    pub const fn results(&self) -> &serde_json::Value {
        &self.results
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether any profiler was active for this run.
    #[must_use]
    pub fn is_profiled(&self) -> bool {
        PROFILING_METADATA_KEYS
            .iter()
            .any(|key| self.metadata.get(*key).is_some_and(is_truthy))
    }

    /// Recover the experiment ID from `{experiment_id}_{dataset}`.
    ///
    /// Strips the first dataset as a suffix; otherwise falls back to a
    /// leading 32-character hex segment.
    #[must_use]
    pub fn experiment_id(&self) -> Option<&str> {
        if let Some(dataset) = self.datasets.first() {
            if let Some(id) = self
                .experiment_name
                .strip_suffix(dataset.as_str())
                .and_then(|rest| rest.strip_suffix('_'))
            {
                if !id.is_empty() {
                    return Some(id);
                }
            }
        }

        let (head, _) = self.experiment_name.split_once('_')?;
        (head.len() == 32 && head.chars().all(|c| c.is_ascii_hexdigit())).then_some(head)
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        serde_json::Value::String(s) => {
            matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
        }
        _ => false,
    }
}

/// Builder for `RunRecord`.
#[derive(Debug)]
pub struct RunRecordBuilder {
    record: RunRecord,
}

impl RunRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(run_id: impl Into<String>, experiment_name: impl Into<String>) -> Self {
        Self {
            record: RunRecord {
                run_id: run_id.into(),
                experiment_name: experiment_name.into(),
                datasets: Vec::new(),
                num_gpus: 0,
                num_rows: None,
                num_cols: None,
                config: serde_json::Value::Null,
                metadata: BTreeMap::new(),
                results: serde_json::Value::Null,
                created_at: Utc::now(),
            },
        }
    }

    /// Set the dataset names.
    #[must_use]
    pub fn datasets<I, S>(mut self, datasets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.datasets = datasets.into_iter().map(Into::into).collect();
        self
    }

    /// Set the GPU count.
    #[must_use]
    pub const fn num_gpus(mut self, num_gpus: u32) -> Self {
        self.record.num_gpus = num_gpus;
        self
    }

    /// Set the dataset shape.
    #[must_use]
    pub const fn shape(mut self, num_rows: u64, num_cols: u64) -> Self {
        self.record.num_rows = Some(num_rows);
        self.record.num_cols = Some(num_cols);
        self
    }

    /// Set the serialized run configuration.
    #[must_use]
    pub fn config(mut self, config: serde_json::Value) -> Self {
        self.record.config = config;
        self
    }

    /// Add one metadata entry, replacing any previous value for `key`.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.record.metadata.insert(key.into(), value.into());
        self
    }

    /// Add every entry of `metadata`.
    #[must_use]
    pub fn extend_metadata(
        mut self,
        metadata: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) -> Self {
        self.record.metadata.extend(metadata);
        self
    }

    /// Set the results payload.
    #[must_use]
    pub fn results(mut self, results: serde_json::Value) -> Self {
        self.record.results = results;
        self
    }

    /// Set a custom creation timestamp (useful when loading and in tests).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.record.created_at = created_at;
        self
    }

    /// Build the `RunRecord`.
    #[must_use]
    pub fn build(self) -> RunRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_hex_run_id() {
        let run = RunRecord::new("exp_anneal", 1);
        assert_eq!(run.run_id().len(), 32);
        assert!(run.run_id().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(run.num_gpus(), 1);
    }

    #[test]
    fn test_is_profiled() {
        let plain = RunRecord::builder("r1", "e_anneal").build();
        assert!(!plain.is_profiled());

        let flagged = RunRecord::builder("r2", "e_anneal")
            .metadata("cuml_accel_profile", "true")
            .build();
        assert!(flagged.is_profiled());

        let off = RunRecord::builder("r3", "e_anneal")
            .metadata("cprofile", false)
            .build();
        assert!(!off.is_profiled());
    }

    #[test]
    fn test_experiment_id_from_dataset_suffix() {
        let run = RunRecord::builder("r", "my_exp_credit-g")
            .datasets(["credit-g"])
            .build();
        assert_eq!(run.experiment_id(), Some("my_exp"));
    }

    #[test]
    fn test_experiment_id_hex_fallback() {
        let id = "d5c9b4244ef14e0480a3c6815c08e803";
        let run = RunRecord::builder("r", format!("{id}_customer_satisfaction_in_airline")).build();
        assert_eq!(run.experiment_id(), Some(id));

        let opaque = RunRecord::builder("r", "quickstart").build();
        assert_eq!(opaque.experiment_id(), None);
    }
}
