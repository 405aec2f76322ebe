//! Text tables and JSON for the reporting tool.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde_json::{json, Map, Value};

use super::{AggregateRow, SpeedupReport};

/// Render rows as a left-aligned, space-padded table.
#[must_use]
pub fn table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(String::len).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.len());
            }
        }
    }

    let mut out = String::new();
    let mut line = |cells: &[String]| {
        let rendered: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect();
        let _ = writeln!(out, "{}", rendered.join("  ").trim_end());
    };
    line(headers);
    for row in rows {
        line(row.as_slice());
    }
    out
}

fn stage_columns<'a>(maps: impl Iterator<Item = &'a std::collections::BTreeMap<String, f64>>) -> Vec<String> {
    let stages: BTreeSet<&String> = maps.flat_map(|m| m.keys()).collect();
    stages.into_iter().cloned().collect()
}

fn cell(value: Option<&f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

/// Aggregate rows as a table with one `{stage}_s` column per stage.
#[must_use]
pub fn aggregate_table(rows: &[AggregateRow]) -> String {
    if rows.is_empty() {
        return "No benchmark runs found.\n".to_string();
    }
    let stages = stage_columns(rows.iter().map(|r| &r.stages));

    let mut headers = vec!["dataset".to_string(), "num_gpus".to_string(), "runs".to_string()];
    headers.extend(stages.iter().map(|s| format!("{s}_s")));

    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            let mut cells = vec![r.dataset.clone(), r.num_gpus.to_string(), r.runs.to_string()];
            cells.extend(stages.iter().map(|s| cell(r.stages.get(s), 3)));
            cells
        })
        .collect();
    table(&headers, &body)
}

/// Aggregate rows as JSON objects with flattened `{stage}_s` keys.
#[must_use]
pub fn aggregate_json(rows: &[AggregateRow]) -> Value {
    Value::Array(
        rows.iter()
            .map(|r| {
                let mut obj = Map::new();
                obj.insert("dataset".into(), json!(r.dataset));
                obj.insert("num_gpus".into(), json!(r.num_gpus));
                obj.insert("runs".into(), json!(r.runs));
                for (stage, secs) in &r.stages {
                    obj.insert(format!("{stage}_s"), json!(secs));
                }
                Value::Object(obj)
            })
            .collect(),
    )
}

/// Speedup report as a table plus an insufficient-data footer.
#[must_use]
pub fn speedup_table(report: &SpeedupReport) -> String {
    let mut out = String::new();
    if report.rows.is_empty() {
        out.push_str("No speedup rows.\n");
    } else {
        let stages = stage_columns(report.rows.iter().map(|r| &r.speedups));
        let mut headers = vec![
            "dataset".to_string(),
            "num_gpus".to_string(),
            "baseline_runs".to_string(),
            "runs".to_string(),
        ];
        headers.extend(stages.iter().map(|s| format!("speedup_{s}")));

        let body: Vec<Vec<String>> = report
            .rows
            .iter()
            .map(|r| {
                let mut cells = vec![
                    r.dataset.clone(),
                    r.num_gpus.to_string(),
                    r.baseline_runs.to_string(),
                    r.runs.to_string(),
                ];
                cells.extend(stages.iter().map(|s| cell(r.speedups.get(s), 2)));
                cells
            })
            .collect();
        let _ = write!(out, "Speedup vs num_gpus=0 ({} timings)\n{}", report.agg, table(&headers, &body));
    }

    for error in report.insufficient_data_errors() {
        let _ = writeln!(out, "{error}");
    }
    out
}

/// Speedup report as JSON with flattened `speedup_{stage}` keys.
#[must_use]
pub fn speedup_json(report: &SpeedupReport) -> Value {
    let rows: Vec<Value> = report
        .rows
        .iter()
        .map(|r| {
            let mut obj = Map::new();
            obj.insert("dataset".into(), json!(r.dataset));
            obj.insert("num_gpus".into(), json!(r.num_gpus));
            obj.insert("baseline_runs".into(), json!(r.baseline_runs));
            obj.insert("runs".into(), json!(r.runs));
            for (stage, ratio) in &r.speedups {
                obj.insert(format!("speedup_{stage}"), json!(ratio));
            }
            Value::Object(obj)
        })
        .collect();

    json!({
        "agg": report.agg,
        "rows": rows,
        "insufficient_data": report.insufficient_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_table_alignment() {
        let out = table(
            &["a".to_string(), "bb".to_string()],
            &[vec!["xxx".to_string(), "y".to_string()]],
        );
        assert_eq!(out, "a    bb\nxxx  y\n");
    }

    #[test]
    fn test_aggregate_json_flattens_stages() {
        let rows = vec![AggregateRow {
            dataset: "anneal".to_string(),
            num_gpus: 1,
            runs: 2,
            stages: BTreeMap::from([("train".to_string(), 2.6)]),
        }];
        let v = aggregate_json(&rows);
        assert_eq!(v[0]["train_s"], json!(2.6));
        assert_eq!(v[0]["num_gpus"], json!(1));
    }

    #[test]
    fn test_speedup_table_lists_insufficient() {
        let report = SpeedupReport {
            insufficient_data: vec!["diabetes".to_string()],
            ..SpeedupReport::default()
        };
        let out = speedup_table(&report);
        assert!(out.contains("No speedup rows."));
        assert!(out.contains("Insufficient data for dataset 'diabetes'"));
    }
}
