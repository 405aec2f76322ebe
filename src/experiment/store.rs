//! Results Store - SQLite persistence for benchmark runs and timings
//!
//! ## Schema
//!
//! ```text
//! benchmark_runs    (run_id UNIQUE, experiment_name, datasets, num_gpus, num_rows,
//!                    num_cols, config_json, metadata_json, results_json, created_at)
//! benchmark_timings (run_id -> benchmark_runs.run_id, stage, time_s, time_ms, recorded_at)
//! ```
//!
//! Writes are append-only and happen in a single immediate transaction, so
//! several benchmark processes can share one database file. WAL journaling
//! plus a busy timeout makes concurrent appenders wait instead of failing.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{RunRecord, TimingRecord};
use crate::{Error, Result};

/// Default database filename.
pub const DEFAULT_DB_NAME: &str = "benchmark_results.db";

/// Table holding one row per run.
pub const RUNS_TABLE: &str = "benchmark_runs";

/// Table holding one row per timed stage.
pub const TIMINGS_TABLE: &str = "benchmark_timings";

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS benchmark_runs (
    seq             INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id          TEXT    NOT NULL UNIQUE,
    experiment_name TEXT    NOT NULL,
    datasets        TEXT    NOT NULL,
    num_gpus        INTEGER NOT NULL,
    num_rows        INTEGER,
    num_cols        INTEGER,
    config_json     TEXT    NOT NULL,
    metadata_json   TEXT    NOT NULL,
    results_json    TEXT    NOT NULL,
    created_at      TEXT    NOT NULL
);
CREATE TABLE IF NOT EXISTS benchmark_timings (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id      TEXT    NOT NULL REFERENCES benchmark_runs(run_id),
    stage       TEXT    NOT NULL,
    time_s      REAL    NOT NULL,
    time_ms     REAL    NOT NULL,
    recorded_at TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_benchmark_timings_run_id ON benchmark_timings(run_id);
CREATE INDEX IF NOT EXISTS idx_benchmark_runs_experiment ON benchmark_runs(experiment_name);
";

const RUN_COLUMNS: &str = "run_id, experiment_name, datasets, num_gpus, num_rows, num_cols, \
                           config_json, metadata_json, results_json, created_at";

/// A run together with its timing rows, as consumed by the reporter.
#[derive(Debug, Clone, PartialEq)]
pub struct RunWithTimings {
    /// The run.
    pub run: RunRecord,
    /// Its timings, in insertion order.
    pub timings: Vec<TimingRecord>,
}

/// Raw rows of one table, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRows {
    /// Table name.
    pub table: String,
    /// Column names, in schema order.
    pub columns: Vec<String>,
    /// One JSON value per column; blobs are summarized by length.
    pub rows: Vec<Vec<Value>>,
}

/// SQLite-backed store for benchmark runs and timings.
#[derive(Debug)]
pub struct ResultsStore {
    conn: Connection,
}

impl ResultsStore {
    /// Open (creating if needed) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening results store");
        Self::init(Connection::open(path)?)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Append one run and its timings atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if a run with the same ID already exists, or on any
    /// database or serialization failure; nothing is written in that case.
    pub fn save_experiment_results(
        &mut self,
        run: &RunRecord,
        timings: &[TimingRecord],
    ) -> Result<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            &format!(
                "INSERT INTO {RUNS_TABLE} ({RUN_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                run.run_id(),
                run.experiment_name(),
                serde_json::to_string(run.datasets())?,
                run.num_gpus(),
                to_sql_count(run.num_rows())?,
                to_sql_count(run.num_cols())?,
                serde_json::to_string(run.config())?,
                serde_json::to_string(run.metadata())?,
                serde_json::to_string(run.results())?,
                format_timestamp(run.created_at()),
            ],
        )?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {TIMINGS_TABLE} (run_id, stage, time_s, time_ms, recorded_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ))?;
            for timing in timings {
                if timing.run_id() != run.run_id() {
                    return Err(Error::Other(format!(
                        "timing for stage '{}' belongs to run '{}', not '{}'",
                        timing.stage(),
                        timing.run_id(),
                        run.run_id()
                    )));
                }
                stmt.execute(params![
                    timing.run_id(),
                    timing.stage(),
                    timing.duration_s(),
                    timing.duration_ms(),
                    format_timestamp(timing.recorded_at()),
                ])?;
            }
        }

        tx.commit()?;
        info!(
            run_id = run.run_id(),
            experiment_name = run.experiment_name(),
            timings = timings.len(),
            "saved experiment results"
        );
        Ok(())
    }

    /// All runs, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error on database or decoding failure.
    pub fn list_runs(&self) -> Result<Vec<RunRecord>> {
        self.query_runs(
            &format!("SELECT {RUN_COLUMNS} FROM {RUNS_TABLE} ORDER BY created_at DESC, seq DESC"),
            [],
        )
    }

    /// Runs whose experiment name starts with `prefix`, most recent first.
    ///
    /// Passing an experiment ID selects every dataset run of that experiment.
    ///
    /// # Errors
    ///
    /// Returns an error on database or decoding failure.
    pub fn list_runs_for_experiment(&self, prefix: &str) -> Result<Vec<RunRecord>> {
        self.query_runs(
            &format!(
                "SELECT {RUN_COLUMNS} FROM {RUNS_TABLE} \
                 WHERE substr(experiment_name, 1, length(?1)) = ?1 \
                 ORDER BY created_at DESC, seq DESC"
            ),
            [prefix],
        )
    }

    /// Resolve a unique run by run ID prefix.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no run matches and
    /// `Error::AmbiguousPrefix` if more than one does.
    pub fn get_run(&self, run_id_prefix: &str) -> Result<RunRecord> {
        let mut matches = self.query_runs(
            &format!(
                "SELECT {RUN_COLUMNS} FROM {RUNS_TABLE} \
                 WHERE substr(run_id, 1, length(?1)) = ?1 ORDER BY seq"
            ),
            [run_id_prefix],
        )?;

        match matches.len() {
            0 => Err(Error::NotFound(run_id_prefix.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::AmbiguousPrefix {
                prefix: run_id_prefix.to_string(),
                matches: matches.iter().map(|r| r.run_id().to_string()).collect(),
            }),
        }
    }

    /// Timings of the run resolved from `run_id_prefix`, in insertion order.
    ///
    /// # Errors
    ///
    /// Same lookup errors as [`ResultsStore::get_run`].
    pub fn get_timings(&self, run_id_prefix: &str) -> Result<Vec<TimingRecord>> {
        let run = self.get_run(run_id_prefix)?;
        self.timings_for(run.run_id())
    }

    fn timings_for(&self, run_id: &str) -> Result<Vec<TimingRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT run_id, stage, time_s, recorded_at FROM {TIMINGS_TABLE} \
             WHERE run_id = ?1 ORDER BY seq"
        ))?;
        let rows = stmt.query_map([run_id], timing_from_row)?;
        rows.map(|r| r?).collect()
    }

    /// Runs (optionally filtered by experiment name prefix) with their timings.
    ///
    /// # Errors
    ///
    /// Returns an error on database or decoding failure.
    pub fn load_runs_with_timings(&self, experiment_filter: Option<&str>) -> Result<Vec<RunWithTimings>> {
        let runs = match experiment_filter {
            Some(prefix) => self.list_runs_for_experiment(prefix)?,
            None => self.list_runs()?,
        };

        let mut stmt = self.conn.prepare(&format!(
            "SELECT run_id, stage, time_s, recorded_at FROM {TIMINGS_TABLE} ORDER BY seq"
        ))?;
        let mut by_run: HashMap<String, Vec<TimingRecord>> = HashMap::new();
        for timing in stmt.query_map([], timing_from_row)? {
            let timing = timing??;
            by_run
                .entry(timing.run_id().to_string())
                .or_default()
                .push(timing);
        }

        Ok(runs
            .into_iter()
            .map(|run| {
                let timings = by_run.remove(run.run_id()).unwrap_or_default();
                RunWithTimings { run, timings }
            })
            .collect())
    }

    /// Row count of each table.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn table_counts(&self) -> Result<Vec<(String, u64)>> {
        let names = self.table_names()?;
        let mut counts = Vec::with_capacity(names.len());
        for name in names {
            let count: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM \"{name}\""),
                [],
                |row| row.get(0),
            )?;
            counts.push((name, from_sql_count(count)));
        }
        Ok(counts)
    }

    /// Names of the user tables, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        Ok(names)
    }

    /// Column names and the first `limit` rows of `table`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownTable` if `table` is not one of
    /// [`ResultsStore::table_names`], or an error on database failure.
    pub fn query_table(&self, table: &str, limit: usize) -> Result<TableRows> {
        let Some(name) = self.table_names()?.into_iter().find(|n| n == table) else {
            return Err(Error::UnknownTable(table.to_string()));
        };

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM \"{name}\" ORDER BY rowid LIMIT ?1"))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let width = columns.len();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = stmt
            .query_map([limit], |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(sql_to_json))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(TableRows {
            table: name,
            columns,
            rows,
        })
    }

    /// Whether a run with exactly this ID exists.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn contains_run(&self, run_id: &str) -> Result<bool> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT 1 FROM {RUNS_TABLE} WHERE run_id = ?1"),
                [run_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some())
    }

    fn query_runs<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, run_from_row)?;
        rows.map(|r| r?).collect()
    }
}

// Row decoders return a nested Result so JSON/timestamp failures surface
// as crate errors instead of being squeezed into rusqlite's error type.

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<Result<RunRecord>> {
    let raw = RawRun {
        run_id: row.get(0)?,
        experiment_name: row.get(1)?,
        datasets: row.get(2)?,
        num_gpus: row.get(3)?,
        num_rows: row.get(4)?,
        num_cols: row.get(5)?,
        config: row.get(6)?,
        metadata: row.get(7)?,
        results: row.get(8)?,
        created_at: row.get(9)?,
    };
    Ok(raw.decode())
}

struct RawRun {
    run_id: String,
    experiment_name: String,
    datasets: String,
    num_gpus: u32,
    num_rows: Option<i64>,
    num_cols: Option<i64>,
    config: String,
    metadata: String,
    results: String,
    created_at: String,
}

impl RawRun {
    fn decode(self) -> Result<RunRecord> {
        let datasets: Vec<String> = serde_json::from_str(&self.datasets)?;
        let metadata: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&self.metadata)?;

        let mut builder = RunRecord::builder(self.run_id, self.experiment_name)
            .datasets(datasets)
            .num_gpus(self.num_gpus)
            .config(serde_json::from_str(&self.config)?)
            .extend_metadata(metadata)
            .results(serde_json::from_str(&self.results)?)
            .created_at(parse_timestamp(&self.created_at)?);
        if let (Some(rows), Some(cols)) = (self.num_rows, self.num_cols) {
            builder = builder.shape(from_sql_count(rows), from_sql_count(cols));
        }
        Ok(builder.build())
    }
}

fn timing_from_row(row: &Row<'_>) -> rusqlite::Result<Result<TimingRecord>> {
    let run_id: String = row.get(0)?;
    let stage: String = row.get(1)?;
    let time_s: f64 = row.get(2)?;
    let recorded_at: String = row.get(3)?;

    Ok(parse_timestamp(&recorded_at)
        .map(|ts| TimingRecord::new(run_id, stage, time_s).with_recorded_at(ts)))
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    // Fixed-width UTC so lexical order in SQL equals chronological order.
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Other(format!("invalid timestamp '{text}': {e}")))
}

fn to_sql_count(count: Option<u64>) -> Result<Option<i64>> {
    count
        .map(|c| i64::try_from(c).map_err(|_| Error::Other(format!("count {c} exceeds SQLite INTEGER range"))))
        .transpose()
}

fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::from(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::from(format!("<{} bytes>", b.len())),
    }
}

fn from_sql_count(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn run(run_id: &str, minute: u32) -> RunRecord {
        RunRecord::builder(run_id, "exp_anneal")
            .datasets(["anneal"])
            .created_at(Utc.with_ymd_and_hms(2025, 1, 15, 12, minute, 0).unwrap())
            .build()
    }

    #[test]
    fn test_store_default_is_empty() {
        let store = ResultsStore::open_in_memory().unwrap();
        assert!(store.list_runs().unwrap().is_empty());
        assert_eq!(
            store.table_counts().unwrap(),
            vec![(RUNS_TABLE.to_string(), 0), (TIMINGS_TABLE.to_string(), 0)]
        );
    }

    #[test]
    fn test_duplicate_run_id_rejected_atomically() {
        let mut store = ResultsStore::open_in_memory().unwrap();
        let first = run("aaaa", 0);
        store
            .save_experiment_results(&first, &[TimingRecord::new("aaaa", "train", 1.0)])
            .unwrap();

        let again = store.save_experiment_results(&first, &[TimingRecord::new("aaaa", "train", 9.0)]);
        assert!(again.is_err());
        assert_eq!(store.get_timings("aaaa").unwrap().len(), 1);
    }

    #[test]
    fn test_foreign_timing_rejected() {
        let mut store = ResultsStore::open_in_memory().unwrap();
        let err = store
            .save_experiment_results(&run("aaaa", 0), &[TimingRecord::new("bbbb", "train", 1.0)])
            .unwrap_err();
        assert!(err.to_string().contains("belongs to run 'bbbb'"));
        assert!(!store.contains_run("aaaa").unwrap());
    }

    #[test]
    fn test_query_table_returns_columns_and_rows() {
        let mut store = ResultsStore::open_in_memory().unwrap();
        for (i, id) in ["aaaa", "bbbb", "cccc"].into_iter().enumerate() {
            store
                .save_experiment_results(&run(id, i as u32), &[TimingRecord::new(id, "train", 1.5)])
                .unwrap();
        }

        let runs = store.query_table(RUNS_TABLE, 2).unwrap();
        assert_eq!(runs.columns[0], "seq");
        assert!(runs.columns.contains(&"experiment_name".to_string()));
        assert_eq!(runs.rows.len(), 2);
        let id_col = runs.columns.iter().position(|c| c == "run_id").unwrap();
        assert_eq!(runs.rows[0][id_col], "aaaa");

        let timings = store.query_table(TIMINGS_TABLE, 10).unwrap();
        let time_col = timings.columns.iter().position(|c| c == "time_s").unwrap();
        assert_eq!(timings.rows[0][time_col], 1.5);
    }

    #[test]
    fn test_query_table_rejects_unknown_names() {
        let store = ResultsStore::open_in_memory().unwrap();
        for name in ["nope", "benchmark_runs; DROP TABLE benchmark_runs", "sqlite_master"] {
            assert!(matches!(store.query_table(name, 5), Err(Error::UnknownTable(_))));
        }
        assert_eq!(store.table_names().unwrap().len(), 2);
    }

    #[test]
    fn test_prefix_is_literal() {
        let mut store = ResultsStore::open_in_memory().unwrap();
        store.save_experiment_results(&run("ab%x", 0), &[]).unwrap();
        store.save_experiment_results(&run("abcd", 1), &[]).unwrap();

        assert_eq!(store.get_run("ab%").unwrap().run_id(), "ab%x");
        assert!(matches!(store.get_run("ab_"), Err(Error::NotFound(_))));
    }
}
