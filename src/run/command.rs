//! Command composer: builds the argument vector for the benchmark program.
//!
//! The wrappers are position-sensitive. The interpreter reads
//! `-m cProfile -o FILE` first, cProfile then runs `-m cuml.accel`, and
//! the accelerator finally runs the script with the remaining arguments:
//!
//! ```text
//! python [-m cProfile -o {prof}] [-m cuml.accel [--profile]] {script}
//!        --datasets {dataset} --experiment-name {id}_{dataset}
//!        [--num-gpus N] [--metadata cprofile=true] [--metadata cuml_accel_profile=true]
//! ```

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use super::{DatasetRun, RunConfig};

/// Metadata flag recorded when cProfile wrapped the run.
pub const CPROFILE_METADATA: &str = "cprofile=true";

/// Metadata flag recorded when the cuML accelerator profiled the run.
pub const CUML_PROFILE_METADATA: &str = "cuml_accel_profile=true";

/// A program and its ordered arguments. Never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl BenchCommand {
    /// Wrap an arbitrary program and arguments.
    #[must_use]
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Compose the benchmark invocation for one dataset run.
    #[must_use]
    pub fn compose(python: &Path, script: &Path, config: &RunConfig, run: &DatasetRun) -> Self {
        let mut cmd = Self::new(python, Vec::<OsString>::new());

        if let Some(profile_file) = run.profile_file() {
            cmd.arg("-m").arg("cProfile").arg("-o").arg(profile_file);
        }

        if config.gpu_accelerated() {
            cmd.arg("-m").arg("cuml.accel");
            if config.gpu_profile() {
                cmd.arg("--profile");
            }
        }

        cmd.arg(script)
            .arg("--datasets")
            .arg(run.dataset().name())
            .arg("--experiment-name")
            .arg(run.experiment_name());

        if let Some(num_gpus) = config.num_gpus() {
            cmd.arg("--num-gpus").arg(num_gpus.to_string());
        }

        if config.cpu_profile() {
            cmd.arg("--metadata").arg(CPROFILE_METADATA);
        }
        if config.gpu_profile() {
            cmd.arg("--metadata").arg(CUML_PROFILE_METADATA);
        }

        cmd
    }

    fn arg(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// The program to execute.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments, in order.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Arguments as lossy UTF-8, for assertions and logs.
    #[must_use]
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// A `std::process::Command` ready to spawn.
    #[must_use]
    pub fn to_command(&self) -> std::process::Command {
        let mut command = std::process::Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for BenchCommand {
    /// Shell-like preview for logs; not meant to be re-parsed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}
