//! Orchestrator tests against a stand-in benchmark program
//!
//! The "interpreter" is `sh` and the "script" is a small shell script that
//! echoes its arguments and prints a results section, except for the
//! datasets it is told to fail on.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use tabarena_bench::run::{
    extract_results, Dataset, DatasetStatus, Extraction, Orchestrator, RunConfig, RunExecutor,
    Workspace,
};
use tabarena_bench::settings::Settings;
use tempfile::TempDir;

const FAKE_BENCHMARK: &str = r#"
for a in "$@"; do echo "arg: $a"; done
mkdir -p AutogluonModels experiments
echo "scratch" > AutogluonModels/model.pkl
case "$*" in
  *"--datasets diabetes"*) echo "Traceback: boom" >&2; exit 1;;
esac
echo "fitting..."
echo "Results:"
echo "  accuracy 0.91"
echo "  time_s 1.5"
"#;

fn fixture() -> (TempDir, Settings) {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bench.sh"), FAKE_BENCHMARK).unwrap();

    let mut settings = Settings::default();
    settings.benchmark.python = PathBuf::from("sh");
    settings.benchmark.script = PathBuf::from("bench.sh");
    (tmp, settings)
}

fn orchestrator<'a>(tmp: &TempDir, settings: &'a Settings, config: &'a RunConfig) -> Orchestrator<'a> {
    Orchestrator::with_working_dir(settings, config, tmp.path().to_path_buf())
        .executor(RunExecutor::new().echo(false))
}

// =============================================================================
// Dataset loop
// =============================================================================

#[test]
fn test_failure_does_not_stop_remaining_datasets() {
    let (tmp, settings) = fixture();
    let config = RunConfig::resolve(false, false, Some("exp1".into()), Some(0)).unwrap();

    let outcomes = orchestrator(&tmp, &settings, &config).run_all(&[
        Dataset::Anneal,
        Dataset::Diabetes,
        Dataset::CreditG,
    ]);

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_completed());
    assert_eq!(
        outcomes[1].status,
        DatasetStatus::MissingResults { exit_code: Some(1) }
    );
    assert!(outcomes[2].is_completed());

    let results = tmp.path().join("results/exp1");
    assert!(results.join("anneal_results.txt").is_file());
    assert!(!results.join("diabetes_results.txt").exists());
    assert!(results.join("credit-g_results.txt").is_file());
}

#[test]
fn test_output_and_results_files() {
    let (tmp, settings) = fixture();
    let config = RunConfig::resolve(false, false, Some("exp2".into()), Some(0)).unwrap();

    let outcome = orchestrator(&tmp, &settings, &config).run_dataset(Dataset::Anneal);
    assert_eq!(outcome.experiment_name, "exp2_anneal");

    let output = fs::read_to_string(&outcome.output_file).unwrap();
    assert!(output.contains("arg: --experiment-name"));
    assert!(output.contains("arg: exp2_anneal"));
    assert!(output.contains("arg: --num-gpus"));

    let DatasetStatus::Completed {
        exit_code,
        results_file,
    } = outcome.status
    else {
        panic!("expected completed run");
    };
    assert_eq!(exit_code, Some(0));
    assert_eq!(
        fs::read_to_string(results_file).unwrap(),
        "Results:\n  accuracy 0.91\n  time_s 1.5\n"
    );
}

#[test]
fn test_stderr_lands_in_output_file() {
    let (tmp, settings) = fixture();
    let config = RunConfig::resolve(false, false, Some("exp3".into()), Some(0)).unwrap();

    let outcome = orchestrator(&tmp, &settings, &config).run_dataset(Dataset::Diabetes);
    let output = fs::read_to_string(&outcome.output_file).unwrap();
    assert!(output.contains("Traceback: boom"));
}

#[test]
fn test_scoped_workspace_is_removed_after_each_dataset() {
    let (tmp, settings) = fixture();
    let config = RunConfig::resolve(false, false, Some("exp4".into()), Some(0)).unwrap();

    orchestrator(&tmp, &settings, &config).run_all(&[Dataset::Anneal, Dataset::Diabetes]);

    let root = tmp.path().join("workspaces");
    assert!(!root.join("exp4_anneal").exists());
    assert!(!root.join("exp4_diabetes").exists());
    assert!(!tmp.path().join("AutogluonModels").exists());
}

#[test]
fn test_scoped_run_cleans_experiments_next_to_script() {
    let (tmp, mut settings) = fixture();
    fs::write(
        tmp.path().join("quickstart.sh"),
        "mkdir -p AutogluonModels \"$(dirname \"$0\")/experiments/quickstart\"\necho \"Results:\"\n",
    )
    .unwrap();
    settings.benchmark.script = PathBuf::from("quickstart.sh");
    let config = RunConfig::resolve(false, false, Some("exp8".into()), Some(0)).unwrap();

    let outcome = orchestrator(&tmp, &settings, &config).run_dataset(Dataset::Anneal);

    assert!(outcome.is_completed());
    assert!(!tmp.path().join("experiments").exists());
    assert!(!tmp.path().join("workspaces/exp8_anneal").exists());
    assert!(tmp.path().join("quickstart.sh").is_file());
}

#[test]
fn test_shared_workspace_cleans_transient_dirs_only() {
    let (tmp, mut settings) = fixture();
    settings.workspace.scope_per_run = false;
    let config = RunConfig::resolve(false, false, Some("exp5".into()), Some(0)).unwrap();

    let outcome = orchestrator(&tmp, &settings, &config).run_dataset(Dataset::Anneal);
    assert!(outcome.is_completed());
    assert!(!tmp.path().join("AutogluonModels").exists());
    assert!(!tmp.path().join("experiments").exists());
    assert!(tmp.path().join("bench.sh").is_file());
}

#[test]
fn test_missing_interpreter_is_recorded_and_loop_continues() {
    let (tmp, mut settings) = fixture();
    settings.benchmark.python = PathBuf::from("definitely-not-a-python-interpreter");
    let config = RunConfig::resolve(false, false, Some("exp6".into()), None).unwrap();

    let outcomes =
        orchestrator(&tmp, &settings, &config).run_all(&[Dataset::Anneal, Dataset::CreditG]);

    assert_eq!(outcomes.len(), 2);
    for outcome in &outcomes {
        assert!(matches!(outcome.status, DatasetStatus::Failed { .. }));
    }
}

#[test]
fn test_cprofile_creates_profile_directory() {
    let (tmp, settings) = fixture();
    let config = RunConfig::resolve(false, true, Some("exp7".into()), Some(0)).unwrap();

    let orch = orchestrator(&tmp, &settings, &config);
    let run = orch.dataset_run(Dataset::Anneal);
    let profile = run.profile_file().unwrap();
    assert!(profile.is_absolute());
    assert!(profile.ends_with("cprofiles/exp7/anneal.prof"));

    // `sh -m cProfile ...` fails, but the directory is created up front.
    let _ = orch.run_dataset(Dataset::Anneal);
    assert!(tmp.path().join("cprofiles/exp7").is_dir());
}

// =============================================================================
// Extraction and workspace edge cases
// =============================================================================

#[test]
fn test_re_extraction_is_byte_identical() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("out.txt");
    let results = tmp.path().join("nested/res.txt");
    fs::write(&output, b"noise\r\nResults: \xff\nline\n").unwrap();

    extract_results(&output, &results).unwrap();
    let first = fs::read(&results).unwrap();
    extract_results(&output, &results).unwrap();
    assert_eq!(fs::read(&results).unwrap(), first);
    assert_eq!(first, b"Results: \xff\nline\n");
}

#[test]
fn test_missing_marker_keeps_existing_results_file() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("out.txt");
    let results = tmp.path().join("res.txt");
    fs::write(&output, "crashed before printing anything\n").unwrap();
    fs::write(&results, "old results\n").unwrap();

    assert_eq!(extract_results(&output, &results).unwrap(), Extraction::MissingMarker);
    assert_eq!(fs::read_to_string(&results).unwrap(), "old results\n");
}

#[test]
fn test_clean_twice_succeeds() {
    let tmp = TempDir::new().unwrap();
    let workspace = Workspace::scoped(
        tmp.path(),
        "exp_anneal",
        vec![PathBuf::from("AutogluonModels")],
    );
    workspace.prepare().unwrap();
    fs::create_dir_all(workspace.dir().join("AutogluonModels/sub")).unwrap();

    workspace.clean().unwrap();
    workspace.clean().unwrap();
    assert!(!Path::new(workspace.dir()).exists());
}
