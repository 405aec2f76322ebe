//! Timing Record - per-stage durations for runs

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stage name the timer uses for the whole run.
pub const TOTAL_STAGE: &str = "total";

/// Timing Record represents one measured stage of a run.
///
/// A run has one record per stage (`train`, `infer`, ... and `total`),
/// stored in `benchmark_timings` and linked to the run by `run_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingRecord {
    run_id: String,
    stage: String,
    duration_s: f64,
    recorded_at: DateTime<Utc>,
}

impl TimingRecord {
    /// Create a new timing record stamped with the current time.
    ///
    /// # Arguments
    ///
    /// * `run_id` - ID of the parent run
    /// * `stage` - Stage name (e.g., "train", "infer")
    /// * `duration_s` - Wall-clock duration in seconds
    #[must_use]
    pub fn new(run_id: impl Into<String>, stage: impl Into<String>, duration_s: f64) -> Self {
        Self {
            run_id: run_id.into(),
            stage: stage.into(),
            duration_s,
            recorded_at: Utc::now(),
        }
    }

    /// Create a timing record from a measured `Duration`.
    #[must_use]
    pub fn from_duration(
        run_id: impl Into<String>,
        stage: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self::new(run_id, stage, duration.as_secs_f64())
    }

    /// Replace the recording timestamp.
    #[must_use]
    pub const fn with_recorded_at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = recorded_at;
        self
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the stage name.
    #[must_use]
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Get the duration in seconds.
    #[must_use]
    pub const fn duration_s(&self) -> f64 {
        self.duration_s
    }

    /// Get the duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        self.duration_s * 1e3
    }

    /// Get the timestamp when the stage finished.
    #[must_use]
    pub const fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_record_new() {
        let timing = TimingRecord::new("run-1", "train", 2.5);
        assert_eq!(timing.run_id(), "run-1");
        assert_eq!(timing.stage(), "train");
        assert!((timing.duration_s() - 2.5).abs() < f64::EPSILON);
        assert!((timing.duration_ms() - 2500.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_duration() {
        let timing = TimingRecord::from_duration("run-1", "infer", Duration::from_millis(1500));
        assert!((timing.duration_s() - 1.5).abs() < 1e-9);
    }
}
