//! Reporter tests: grouping, medians and speedup ratios.

use tabarena_bench::experiment::{RunRecord, RunWithTimings, TimingRecord};
use tabarena_bench::report::{self, aggregate_by, Aggregation, RunFilter};

fn entry(id: &str, name: &str, dataset: &str, gpus: u32, fit_s: f64, profiled: bool) -> RunWithTimings {
    let mut builder = RunRecord::builder(id, name).datasets([dataset]).num_gpus(gpus);
    if profiled {
        builder = builder.metadata("cprofile", true);
    }
    RunWithTimings {
        run: builder.build(),
        timings: vec![
            TimingRecord::new(id, "fit", fit_s),
            TimingRecord::new(id, "total", fit_s + 1.0),
        ],
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// =============================================================================
// Aggregation
// =============================================================================

#[test]
fn test_aggregate_groups_by_dataset_and_gpus() {
    let runs = vec![
        entry("r1", "e_anneal", "anneal", 0, 3.0, false),
        entry("r2", "e_anneal", "anneal", 0, 4.0, false),
        entry("r3", "e_anneal", "anneal", 0, 3.2, false),
        entry("r4", "e_anneal", "anneal", 1, 2.6, false),
        entry("r5", "e_diabetes", "diabetes", 1, 1.0, false),
    ];
    let rows = report::aggregate(&runs, None);

    assert_eq!(rows.len(), 3);
    assert_eq!((rows[0].dataset.as_str(), rows[0].num_gpus, rows[0].runs), ("anneal", 0, 3));
    assert!(close(rows[0].stages["fit"], 3.2));
    assert!(close(rows[0].stages["total"], 4.2));
    assert_eq!((rows[1].dataset.as_str(), rows[1].num_gpus), ("anneal", 1));
    assert_eq!(rows[2].dataset, "diabetes");
}

#[test]
fn test_aggregate_filters_by_experiment_prefix() {
    let runs = vec![
        entry("r1", "abc_anneal", "anneal", 0, 3.0, false),
        entry("r2", "xyz_anneal", "anneal", 0, 9.0, false),
    ];
    let rows = report::aggregate(&runs, Some("abc"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].runs, 1);
    assert!(close(rows[0].stages["fit"], 3.0));
}

#[test]
fn test_min_aggregation() {
    let runs = vec![
        entry("r1", "e", "anneal", 0, 3.0, false),
        entry("r2", "e", "anneal", 0, 2.5, false),
    ];
    let rows = aggregate_by(&runs, Aggregation::Min, RunFilter::default());
    assert!(close(rows[0].stages["fit"], 2.5));
}

#[test]
fn test_empty_input_gives_empty_output() {
    assert!(report::aggregate(&[], None).is_empty());
    let report = report::speedup(&[], Aggregation::Median, false, None);
    assert!(report.rows.is_empty());
    assert!(report.insufficient_data.is_empty());
}

// =============================================================================
// Speedup
// =============================================================================

#[test]
fn test_anneal_speedup_matches_ratio_of_medians() {
    let runs = vec![
        entry("c1", "e_anneal", "anneal", 0, 3.1, false),
        entry("c2", "e_anneal", "anneal", 0, 3.2, false),
        entry("c3", "e_anneal", "anneal", 0, 3.3, false),
        entry("g1", "e_anneal", "anneal", 1, 2.5, false),
        entry("g2", "e_anneal", "anneal", 1, 2.6, false),
        entry("g3", "e_anneal", "anneal", 1, 2.7, false),
    ];
    let report = report::speedup(&runs, Aggregation::Median, false, None);
    let row = report.row("anneal", 1).unwrap();

    assert_eq!(row.baseline_runs, 3);
    assert_eq!(row.runs, 3);
    assert!(close(row.speedups["fit"], 3.2 / 2.6));
    assert!((row.speedups["fit"] - 1.23).abs() < 0.005);
    assert!(report.row("anneal", 0).is_none());
}

#[test]
fn test_one_row_per_gpu_group() {
    let runs = vec![
        entry("c1", "e", "credit-g", 0, 4.0, false),
        entry("g1", "e", "credit-g", 1, 2.0, false),
        entry("g2", "e", "credit-g", 2, 1.0, false),
    ];
    let report = report::speedup(&runs, Aggregation::Median, false, None);
    assert_eq!(report.rows.len(), 2);
    assert!(close(report.row("credit-g", 1).unwrap().speedups["fit"], 2.0));
    assert!(close(report.row("credit-g", 2).unwrap().speedups["fit"], 4.0));
}

#[test]
fn test_missing_baseline_is_insufficient_data_not_abort() {
    let runs = vec![
        entry("g1", "e", "diabetes", 1, 1.0, false),
        entry("c1", "e", "anneal", 0, 3.0, false),
        entry("g2", "e", "anneal", 1, 1.5, false),
    ];
    let report = report::speedup(&runs, Aggregation::Median, false, None);

    assert_eq!(report.insufficient_data, ["diabetes"]);
    assert!(report.row("anneal", 1).is_some());
    let errors: Vec<String> = report.insufficient_data_errors().map(|e| e.to_string()).collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Insufficient data for dataset 'diabetes'"));
}

#[test]
fn test_profiled_runs_excluded_by_default() {
    let runs = vec![
        entry("c1", "e", "anneal", 0, 3.0, false),
        entry("g1", "e", "anneal", 1, 1.5, false),
        entry("g2", "e", "anneal", 1, 30.0, true),
    ];

    let report = report::speedup(&runs, Aggregation::Median, false, None);
    let row = report.row("anneal", 1).unwrap();
    assert_eq!(row.runs, 1);
    assert!(close(row.speedups["fit"], 2.0));

    let report = report::speedup(&runs, Aggregation::Median, true, None);
    let row = report.row("anneal", 1).unwrap();
    assert_eq!(row.runs, 2);
    assert!(close(row.speedups["fit"], 3.0 / 15.75));
}

#[test]
fn test_profiled_baseline_only_is_insufficient() {
    let runs = vec![
        entry("c1", "e", "anneal", 0, 3.0, true),
        entry("g1", "e", "anneal", 1, 1.5, false),
    ];
    let report = report::speedup(&runs, Aggregation::Median, false, None);
    assert!(report.rows.is_empty());
    assert_eq!(report.insufficient_data, ["anneal"]);
}

#[test]
fn test_speedup_json_shape() {
    let runs = vec![
        entry("c1", "e", "anneal", 0, 3.0, false),
        entry("g1", "e", "anneal", 1, 1.5, false),
    ];
    let report = report::speedup(&runs, Aggregation::Min, false, None);
    let json = report::render::speedup_json(&report);

    assert_eq!(json["agg"], "min");
    assert_eq!(json["rows"][0]["dataset"], "anneal");
    assert_eq!(json["rows"][0]["speedup_fit"], 2.0);
    assert!(json["insufficient_data"].as_array().unwrap().is_empty());
}
