//! Benchmark Timer - stage timing for benchmark programs
//!
//! A benchmark program creates one timer per run, wraps each stage in
//! [`BenchmarkTimer::time`], and finally calls [`BenchmarkTimer::save`],
//! which adds the `total` stage and appends everything to the store.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::debug;
use uuid::Uuid;

use super::{collect_metadata, MetadataCollector, ResultsStore, RunRecord, RunRecordBuilder, TimingRecord, TOTAL_STAGE};
use crate::Result;

/// Times the stages of one benchmark run.
#[derive(Debug)]
pub struct BenchmarkTimer {
    run_id: String,
    experiment_name: String,
    started: Instant,
    timings: Vec<TimingRecord>,
}

impl BenchmarkTimer {
    /// Start a timer for `experiment_name` with a fresh run ID.
    #[must_use]
    pub fn new(experiment_name: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().simple().to_string(),
            experiment_name: experiment_name.into(),
            started: Instant::now(),
            timings: Vec::new(),
        }
    }

    /// The run ID every timing is tagged with.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// The experiment name.
    #[must_use]
    pub fn experiment_name(&self) -> &str {
        &self.experiment_name
    }

    /// Run `f`, recording its wall-clock time under `stage`.
    pub fn time<T>(&mut self, stage: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let value = f();
        self.record(stage, start.elapsed());
        value
    }

    /// Record an externally measured stage.
    pub fn record(&mut self, stage: &str, elapsed: Duration) {
        debug!(stage, elapsed_s = elapsed.as_secs_f64(), "stage timed");
        self.timings
            .push(TimingRecord::from_duration(&self.run_id, stage, elapsed));
    }

    /// Record the time since the timer was created as the `total` stage.
    pub fn record_total_time(&mut self) {
        self.record(TOTAL_STAGE, self.started.elapsed());
    }

    /// Timings recorded so far.
    #[must_use]
    pub fn timings(&self) -> &[TimingRecord] {
        &self.timings
    }

    /// A run record builder pre-filled with this timer's IDs and the
    /// environment metadata of `repo_dir`.
    #[must_use]
    pub fn run_builder(&self, repo_dir: &Path) -> RunRecordBuilder {
        RunRecord::builder(&self.run_id, &self.experiment_name)
            .extend_metadata(collect_metadata(repo_dir))
    }

    /// Like [`BenchmarkTimer::run_builder`], probing with `collector`
    /// (e.g. to record a specific interpreter).
    #[must_use]
    pub fn run_builder_with(&self, collector: &MetadataCollector) -> RunRecordBuilder {
        RunRecord::builder(&self.run_id, &self.experiment_name).extend_metadata(collector.collect())
    }

    /// Human-readable `stage  time_ms  time_s` table.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.timings.is_empty() {
            return "No timings recorded.".to_string();
        }
        let width = self
            .timings
            .iter()
            .map(|t| t.stage().len())
            .max()
            .unwrap_or(0)
            .max("stage".len());

        let mut out = format!("{:<width$}  {:>12}  {:>10}\n", "stage", "time_ms", "time_s");
        for timing in &self.timings {
            out.push_str(&format!(
                "{:<width$}  {:>12.3}  {:>10.3}\n",
                timing.stage(),
                timing.duration_ms(),
                timing.duration_s()
            ));
        }
        out
    }

    /// Record the total time and append `run` with every timing to `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if `run` was not built for this timer's run ID, or
    /// if the store rejects the write.
    pub fn save(mut self, store: &mut ResultsStore, run: &RunRecord) -> Result<()> {
        self.record_total_time();
        store.save_experiment_results(run, &self.timings)
    }
}
