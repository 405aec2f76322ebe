//! Per-dataset output layout.

use std::path::{Path, PathBuf};

use super::{Dataset, RunConfig};
use crate::settings::PathSettings;

/// One (dataset × run configuration) execution and the files it produces.
///
/// ```text
/// results/{experiment_id}/{dataset}_output.txt
/// results/{experiment_id}/{dataset}_results.txt
/// cprofiles/{experiment_id}/{dataset}.prof     (cProfile only)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRun {
    dataset: Dataset,
    experiment_name: String,
    output_file: PathBuf,
    results_file: PathBuf,
    profile_file: Option<PathBuf>,
}

impl DatasetRun {
    /// Lay out the files for `dataset` under `paths`.
    #[must_use]
    pub fn new(config: &RunConfig, dataset: Dataset, paths: &PathSettings) -> Self {
        let experiment_id = config.experiment_id().as_str();
        let results_dir = paths.results_dir.join(experiment_id);

        Self {
            dataset,
            experiment_name: format!("{experiment_id}_{dataset}"),
            output_file: results_dir.join(format!("{dataset}_output.txt")),
            results_file: results_dir.join(format!("{dataset}_results.txt")),
            profile_file: config.cpu_profile().then(|| {
                paths
                    .profiles_dir
                    .join(experiment_id)
                    .join(format!("{dataset}.prof"))
            }),
        }
    }

    /// The dataset.
    #[must_use]
    pub const fn dataset(&self) -> Dataset {
        self.dataset
    }

    /// `{experiment_id}_{dataset}`, the name the benchmark program tags its rows with.
    #[must_use]
    pub fn experiment_name(&self) -> &str {
        &self.experiment_name
    }

    /// Captured console output.
    #[must_use]
    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    /// Section of the output from the `Results:` marker onward.
    #[must_use]
    pub fn results_file(&self) -> &Path {
        &self.results_file
    }

    /// cProfile output, when CPU profiling is enabled.
    #[must_use]
    pub fn profile_file(&self) -> Option<&Path> {
        self.profile_file.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_namespaced_by_experiment_id() {
        let config = RunConfig::resolve(false, true, Some("abc".to_string()), None).unwrap();
        let run = DatasetRun::new(&config, Dataset::Anneal, &PathSettings::default());

        assert_eq!(run.experiment_name(), "abc_anneal");
        assert_eq!(run.output_file(), Path::new("results/abc/anneal_output.txt"));
        assert_eq!(run.results_file(), Path::new("results/abc/anneal_results.txt"));
        assert_eq!(run.profile_file(), Some(Path::new("cprofiles/abc/anneal.prof")));
    }

    #[test]
    fn test_no_profile_file_without_cprofile() {
        let config = RunConfig::resolve(true, false, None, None).unwrap();
        let run = DatasetRun::new(&config, Dataset::Diabetes, &PathSettings::default());
        assert!(run.profile_file().is_none());
    }
}
