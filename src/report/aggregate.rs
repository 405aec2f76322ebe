//! Grouped timing statistics by (dataset, GPU count).

use std::collections::BTreeMap;

use serde::Serialize;

use super::Aggregation;
use crate::experiment::RunWithTimings;

/// One (dataset, num_gpus) group with a collapsed duration per stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    /// Comma-joined dataset names.
    pub dataset: String,
    /// GPU count of every run in the group.
    pub num_gpus: u32,
    /// Number of runs in the group.
    pub runs: usize,
    /// Stage name to aggregated duration in seconds.
    pub stages: BTreeMap<String, f64>,
}

/// Which runs take part in an aggregation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunFilter<'a> {
    /// Keep runs whose experiment name starts with this prefix.
    pub experiment: Option<&'a str>,
    /// Keep runs that had a profiler attached.
    pub include_profiled: bool,
}

impl RunFilter<'_> {
    fn accepts(&self, entry: &RunWithTimings) -> bool {
        let name_ok = self
            .experiment
            .map_or(true, |prefix| entry.run.experiment_name().starts_with(prefix));
        name_ok && (self.include_profiled || !entry.run.is_profiled())
    }
}

/// Per-run stage durations; repeated rows for one stage are summed.
pub(crate) fn stage_durations(entry: &RunWithTimings) -> BTreeMap<String, f64> {
    let mut stages = BTreeMap::new();
    for timing in &entry.timings {
        *stages.entry(timing.stage().to_string()).or_insert(0.0) += timing.duration_s();
    }
    stages
}

/// Group runs by (dataset, num_gpus) and collapse every stage with `agg`.
///
/// Rows are ordered by dataset, then GPU count.
#[must_use]
pub fn aggregate_by(
    runs: &[RunWithTimings],
    agg: Aggregation,
    filter: RunFilter<'_>,
) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<(String, u32), Vec<BTreeMap<String, f64>>> = BTreeMap::new();
    for entry in runs.iter().filter(|e| filter.accepts(e)) {
        groups
            .entry((entry.run.dataset_key(), entry.run.num_gpus()))
            .or_default()
            .push(stage_durations(entry));
    }

    groups
        .into_iter()
        .map(|((dataset, num_gpus), members)| {
            let mut samples: BTreeMap<String, Vec<f64>> = BTreeMap::new();
            for stages in &members {
                for (stage, duration) in stages {
                    samples.entry(stage.clone()).or_default().push(*duration);
                }
            }
            let stages = samples
                .into_iter()
                .filter_map(|(stage, values)| agg.apply(&values).map(|v| (stage, v)))
                .collect();

            AggregateRow {
                dataset,
                num_gpus,
                runs: members.len(),
                stages,
            }
        })
        .collect()
}

/// Median of every stage per (dataset, num_gpus) group, profiled runs included.
#[must_use]
pub fn aggregate(runs: &[RunWithTimings], experiment_filter: Option<&str>) -> Vec<AggregateRow> {
    aggregate_by(
        runs,
        Aggregation::Median,
        RunFilter {
            experiment: experiment_filter,
            include_profiled: true,
        },
    )
}
