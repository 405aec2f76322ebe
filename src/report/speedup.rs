//! GPU-vs-CPU speedup relative to the `num_gpus = 0` baseline.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use super::{aggregate_by, AggregateRow, Aggregation, RunFilter};
use crate::experiment::RunWithTimings;
use crate::{Error, Result};

/// Speedup of one GPU group over its dataset's baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedupRow {
    /// Comma-joined dataset names.
    pub dataset: String,
    /// GPU count of the accelerated group.
    pub num_gpus: u32,
    /// Runs in the baseline group.
    pub baseline_runs: usize,
    /// Runs in the accelerated group.
    pub runs: usize,
    /// Stage name to `baseline_duration / gpu_duration`.
    pub speedups: BTreeMap<String, f64>,
}

/// Speedups for every dataset that has a baseline, and the datasets that do not.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpeedupReport {
    /// Aggregation used on both sides of each ratio.
    pub agg: Aggregation,
    /// One row per (dataset, GPU group).
    pub rows: Vec<SpeedupRow>,
    /// Datasets with GPU runs but no `num_gpus = 0` baseline.
    pub insufficient_data: Vec<String>,
}

impl SpeedupReport {
    /// The insufficient-data datasets as errors.
    pub fn insufficient_data_errors(&self) -> impl Iterator<Item = Error> + '_ {
        self.insufficient_data
            .iter()
            .map(|dataset| Error::InsufficientData {
                dataset: dataset.clone(),
            })
    }

    /// Speedup row for `dataset` at `num_gpus`, if any.
    #[must_use]
    pub fn row(&self, dataset: &str, num_gpus: u32) -> Option<&SpeedupRow> {
        self.rows
            .iter()
            .find(|r| r.dataset == dataset && r.num_gpus == num_gpus)
    }
}

/// Speedups of one dataset's groups over its baseline group.
///
/// `groups` must all belong to the same dataset.
///
/// # Errors
///
/// Returns `Error::InsufficientData` if no group has `num_gpus = 0`.
pub fn dataset_speedups(dataset: &str, groups: &[&AggregateRow]) -> Result<Vec<SpeedupRow>> {
    let baseline = groups
        .iter()
        .find(|g| g.num_gpus == 0)
        .ok_or_else(|| Error::InsufficientData {
            dataset: dataset.to_string(),
        })?;

    Ok(groups
        .iter()
        .filter(|g| g.num_gpus != 0)
        .map(|gpu| {
            let speedups = gpu
                .stages
                .iter()
                .filter_map(|(stage, &gpu_s)| {
                    let base_s = *baseline.stages.get(stage)?;
                    if gpu_s <= 0.0 {
                        warn!(dataset, stage = stage.as_str(), num_gpus = gpu.num_gpus, "zero GPU duration; skipping stage");
                        return None;
                    }
                    Some((stage.clone(), base_s / gpu_s))
                })
                .collect();

            SpeedupRow {
                dataset: dataset.to_string(),
                num_gpus: gpu.num_gpus,
                baseline_runs: baseline.runs,
                runs: gpu.runs,
                speedups,
            }
        })
        .collect())
}

/// Compute `baseline / gpu` per stage for every dataset.
///
/// Profiled runs are excluded unless `include_profiled` is set, since
/// profiler overhead distorts the timings. Datasets lacking a baseline are
/// listed in [`SpeedupReport::insufficient_data`] rather than dropped.
#[must_use]
pub fn speedup(
    runs: &[RunWithTimings],
    agg: Aggregation,
    include_profiled: bool,
    experiment_filter: Option<&str>,
) -> SpeedupReport {
    let rows = aggregate_by(
        runs,
        agg,
        RunFilter {
            experiment: experiment_filter,
            include_profiled,
        },
    );

    let mut by_dataset: BTreeMap<&str, Vec<&AggregateRow>> = BTreeMap::new();
    for row in &rows {
        by_dataset.entry(row.dataset.as_str()).or_default().push(row);
    }

    let mut report = SpeedupReport {
        agg,
        ..SpeedupReport::default()
    };
    for (dataset, groups) in by_dataset {
        match dataset_speedups(dataset, &groups) {
            Ok(mut speedups) => report.rows.append(&mut speedups),
            Err(e) => {
                warn!(error = %e, "speedup unavailable");
                report.insufficient_data.push(dataset.to_string());
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(num_gpus: u32, train: f64) -> AggregateRow {
        AggregateRow {
            dataset: "anneal".to_string(),
            num_gpus,
            runs: 1,
            stages: BTreeMap::from([("train".to_string(), train)]),
        }
    }

    #[test]
    fn test_dataset_speedups_ratio() {
        let base = group(0, 3.0);
        let gpu = group(2, 1.5);
        let rows = dataset_speedups("anneal", &[&base, &gpu]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].num_gpus, 2);
        assert!((rows[0].speedups["train"] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_gpu_duration_skipped() {
        let base = group(0, 3.0);
        let gpu = group(1, 0.0);
        let rows = dataset_speedups("anneal", &[&base, &gpu]).unwrap();
        assert!(rows[0].speedups.is_empty());
    }

    #[test]
    fn test_missing_baseline() {
        let gpu = group(1, 1.0);
        let err = dataset_speedups("anneal", &[&gpu]).unwrap_err();
        assert!(matches!(err, Error::InsufficientData { dataset } if dataset == "anneal"));
    }
}
