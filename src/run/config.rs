//! Run configuration: the validated, immutable result of the orchestrator's flags.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Which profilers wrap the benchmark program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfilingMode {
    /// No profiling.
    #[default]
    None,
    /// cProfile call-graph profiling only.
    CpuOnly,
    /// cuML accelerator profiling only.
    GpuOnly,
    /// Both profilers.
    Both,
}

impl ProfilingMode {
    /// Build the mode from the two independent command-line flags.
    #[must_use]
    pub const fn from_flags(cpu_profile: bool, gpu_profile: bool) -> Self {
        match (cpu_profile, gpu_profile) {
            (false, false) => Self::None,
            (true, false) => Self::CpuOnly,
            (false, true) => Self::GpuOnly,
            (true, true) => Self::Both,
        }
    }

    /// Whether cProfile wraps the run.
    #[must_use]
    pub const fn cpu(self) -> bool {
        matches!(self, Self::CpuOnly | Self::Both)
    }

    /// Whether the cuML accelerator profiles the run.
    #[must_use]
    pub const fn gpu(self) -> bool {
        matches!(self, Self::GpuOnly | Self::Both)
    }
}

/// Opaque identifier namespacing one invocation's outputs and database rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperimentId(String);

impl ExperimentId {
    /// Generate a fresh 32-character lowercase hex identifier from a random UUID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string().to_ascii_lowercase())
    }

    /// The identifier as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ExperimentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated configuration for one orchestrator invocation.
///
/// Constructed once by [`RunConfig::resolve`] and passed by reference to
/// every downstream component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    experiment_id: ExperimentId,
    profiling: ProfilingMode,
    num_gpus: Option<u32>,
}

impl RunConfig {
    /// Resolve raw flag values into a configuration.
    ///
    /// A fresh experiment ID is generated when `experiment_id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if GPU profiling is requested together with
    /// `num_gpus = 0`. No other combination is rejected.
    pub fn resolve(
        gpu_profile: bool,
        cpu_profile: bool,
        experiment_id: Option<String>,
        num_gpus: Option<u32>,
    ) -> Result<Self> {
        if gpu_profile && num_gpus == Some(0) {
            return Err(Error::Config(
                "--cuml-profile cannot be combined with --num-gpus 0 \
                 (GPU profiling requires GPU acceleration)"
                    .to_string(),
            ));
        }

        Ok(Self {
            experiment_id: experiment_id.map_or_else(ExperimentId::generate, ExperimentId::from),
            profiling: ProfilingMode::from_flags(cpu_profile, gpu_profile),
            num_gpus,
        })
    }

    /// The experiment ID.
    #[must_use]
    pub const fn experiment_id(&self) -> &ExperimentId {
        &self.experiment_id
    }

    /// The profiling mode.
    #[must_use]
    pub const fn profiling(&self) -> ProfilingMode {
        self.profiling
    }

    /// Whether cuML accelerator profiling is enabled.
    #[must_use]
    pub const fn gpu_profile(&self) -> bool {
        self.profiling.gpu()
    }

    /// Whether cProfile profiling is enabled.
    #[must_use]
    pub const fn cpu_profile(&self) -> bool {
        self.profiling.cpu()
    }

    /// Explicit GPU count, if one was given.
    #[must_use]
    pub const fn num_gpus(&self) -> Option<u32> {
        self.num_gpus
    }

    /// Whether the cuML accelerator wraps the run (GPU count unset or non-zero).
    #[must_use]
    pub const fn gpu_accelerated(&self) -> bool {
        !matches!(self.num_gpus, Some(0))
    }
}
