//! Environment metadata captured alongside every run.
//!
//! Keys are namespaced by category (`system.*`, `cuda.*`, `python.*`,
//! `git.*`) so the reporter's `info --category` can filter them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Utc;
use serde_json::Value;

/// Collect execution time, system, CUDA, Python and git metadata with the
/// default tools (`python` and `nvidia-smi` on `PATH`).
#[must_use]
pub fn collect_metadata(repo_dir: &Path) -> BTreeMap<String, Value> {
    MetadataCollector::new(repo_dir).collect()
}

/// Best-effort environment metadata collector.
///
/// Anything that cannot be determined is stored as `null` (with an
/// `*_error` entry where a tool failed), never returned as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataCollector {
    repo_dir: PathBuf,
    python: PathBuf,
    nvidia_smi: PathBuf,
}

impl MetadataCollector {
    /// Read git metadata from the repository containing `repo_dir`.
    #[must_use]
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            python: PathBuf::from("python"),
            nvidia_smi: PathBuf::from("nvidia-smi"),
        }
    }

    /// Interpreter whose version is recorded under `python.*`.
    #[must_use]
    pub fn python(mut self, python: impl Into<PathBuf>) -> Self {
        self.python = python.into();
        self
    }

    /// `nvidia-smi` binary queried for `cuda.*`.
    #[must_use]
    pub fn nvidia_smi(mut self, nvidia_smi: impl Into<PathBuf>) -> Self {
        self.nvidia_smi = nvidia_smi.into();
        self
    }

    /// Collect every category.
    #[must_use]
    pub fn collect(&self) -> BTreeMap<String, Value> {
        let mut metadata = BTreeMap::new();
        let now = Utc::now();
        metadata.insert("execution_datetime".to_string(), Value::from(now.to_rfc3339()));
        metadata.insert("execution_timestamp".to_string(), Value::from(now.timestamp()));

        let categories = [
            ("system", system_info()),
            ("cuda", cuda_info(&self.nvidia_smi)),
            ("python", python_info(&self.python)),
            ("git", git_info(&self.repo_dir)),
        ];
        for (category, entries) in categories {
            for (key, value) in entries {
                metadata.insert(format!("{category}.{key}"), value);
            }
        }
        metadata
    }
}

fn system_info() -> Vec<(&'static str, Value)> {
    vec![
        ("os", Value::from(std::env::consts::OS)),
        ("architecture", Value::from(std::env::consts::ARCH)),
        ("family", Value::from(std::env::consts::FAMILY)),
        ("hostname", optional(hostname())),
        ("user", optional(env_any(&["USER", "USERNAME"]))),
        (
            "cpu_count",
            std::thread::available_parallelism().map_or(Value::Null, |n| Value::from(n.get())),
        ),
    ]
}

fn cuda_info(nvidia_smi: &Path) -> Vec<(&'static str, Value)> {
    let names = run_tool(nvidia_smi, &["--query-gpu=name", "--format=csv,noheader"])
        .map(|out| parse_gpu_names(&out));

    match names {
        Ok(names) => {
            let version = run_tool(nvidia_smi, &[]).ok().and_then(|out| parse_cuda_version(&out));
            vec![
                ("cuda_available", Value::from(!names.is_empty())),
                ("cuda_device_count", Value::from(names.len())),
                ("cuda_device_names", Value::from(names)),
                ("cuda_version", optional(version)),
            ]
        }
        Err(error) => vec![
            ("cuda_available", Value::from(false)),
            ("cuda_device_count", Value::from(0)),
            ("cuda_device_names", Value::Array(Vec::new())),
            ("cuda_version", Value::Null),
            ("cuda_error", Value::from(error)),
        ],
    }
}

/// One device name per non-empty line of `--format=csv,noheader` output.
fn parse_gpu_names(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// The `CUDA Version: 12.4` field of the `nvidia-smi` banner.
fn parse_cuda_version(banner: &str) -> Option<String> {
    let (_, rest) = banner.split_once("CUDA Version:")?;
    rest.split_whitespace()
        .next()
        .map(|v| v.trim_end_matches('|').to_string())
        .filter(|v| !v.is_empty())
}

fn python_info(python: &Path) -> Vec<(&'static str, Value)> {
    let executable = ("python_executable", Value::from(python.display().to_string()));
    match run_tool(python, &["--version"]) {
        Ok(out) => {
            let version = out.trim().strip_prefix("Python ").map(str::to_string);
            let implementation = run_tool(
                python,
                &["-c", "import platform; print(platform.python_implementation())"],
            )
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
            vec![
                ("python_version", optional(version)),
                ("python_implementation", optional(implementation)),
                executable,
            ]
        }
        Err(error) => vec![
            ("python_version", Value::Null),
            ("python_implementation", Value::Null),
            executable,
            ("python_error", Value::from(error)),
        ],
    }
}

/// Stdout of a successful run (stderr when stdout is empty, as old
/// interpreters print `--version` there), or the failure as text.
fn run_tool(program: &Path, args: &[&str]) -> Result<String, String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| format!("{}: {e}", program.display()))?;
    if !output.status.success() {
        return Err(format!("{} exited with {}", program.display(), output.status));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if stdout.trim().is_empty() {
        Ok(String::from_utf8_lossy(&output.stderr).into_owned())
    } else {
        Ok(stdout.into_owned())
    }
}

fn git_info(repo_dir: &Path) -> Vec<(&'static str, Value)> {
    let commit = git(repo_dir, &["rev-parse", "HEAD"]);
    let branch = git(repo_dir, &["rev-parse", "--abbrev-ref", "HEAD"]).filter(|b| b != "HEAD");
    let dirty = git(repo_dir, &["status", "--porcelain"]).map(|s| !s.is_empty());
    let working_dir = git(repo_dir, &["rev-parse", "--show-toplevel"]);

    vec![
        ("commit", optional(commit)),
        ("branch", optional(branch)),
        ("dirty", dirty.map_or(Value::Null, Value::from)),
        ("working_dir", optional(working_dir)),
    ]
}

fn git(repo_dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn hostname() -> Option<String> {
    env_any(&["HOSTNAME", "COMPUTERNAME"]).or_else(|| {
        std::fs::read_to_string("/etc/hostname")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

fn env_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()))
}

fn optional(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::from)
}
