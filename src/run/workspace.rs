//! Workspace cleaner: transient directories left behind by the benchmark program.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::settings::WorkspaceSettings;
use crate::Result;

/// The directory a dataset run executes in and the transient
/// subdirectories removed after it.
///
/// Transient directories are removed under the workspace and under every
/// extra root added with [`Workspace::also_clean_under`]. The benchmark
/// program writes `experiments/` next to its script, not into its working
/// directory, so the orchestrator adds the script directory as a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    dir: PathBuf,
    transient_dirs: Vec<PathBuf>,
    extra_roots: Vec<PathBuf>,
    scoped: bool,
}

impl Workspace {
    /// Per-run workspace at `{root}/{experiment_name}`, removed entirely on cleanup.
    #[must_use]
    pub fn scoped(root: &Path, experiment_name: &str, transient_dirs: Vec<PathBuf>) -> Self {
        Self {
            dir: root.join(experiment_name),
            transient_dirs,
            extra_roots: Vec::new(),
            scoped: true,
        }
    }

    /// Shared workspace at `dir` (usually the process working directory).
    ///
    /// Only the transient subdirectories are removed. Concurrent
    /// invocations sharing `dir` race on them.
    #[must_use]
    pub fn shared(dir: impl Into<PathBuf>, transient_dirs: Vec<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            transient_dirs,
            extra_roots: Vec::new(),
            scoped: false,
        }
    }

    /// Pick scoped or shared according to `settings`.
    #[must_use]
    pub fn from_settings(settings: &WorkspaceSettings, cwd: &Path, experiment_name: &str) -> Self {
        let transient = settings.transient_dirs.clone();
        if settings.scope_per_run {
            Self::scoped(&cwd.join(&settings.root), experiment_name, transient)
        } else {
            Self::shared(cwd, transient)
        }
    }

    /// Also remove the transient directories under `root`.
    ///
    /// Adding the workspace itself, or a root twice, is a no-op.
    #[must_use]
    pub fn also_clean_under(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        if root != self.dir && !self.extra_roots.contains(&root) {
            self.extra_roots.push(root);
        }
        self
    }

    /// Extra roots cleaned besides the workspace.
    #[must_use]
    pub fn extra_roots(&self) -> &[PathBuf] {
        &self.extra_roots
    }

    /// Working directory for the benchmark process.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether this workspace belongs to a single run.
    #[must_use]
    pub const fn is_scoped(&self) -> bool {
        self.scoped
    }

    /// Create the working directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn prepare(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Remove the transient directories under the workspace and every extra
    /// root, then the workspace itself if scoped.
    ///
    /// Absent directories are skipped, so cleaning twice is harmless.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing directory cannot be removed.
    pub fn clean(&self) -> Result<()> {
        for root in std::iter::once(&self.dir).chain(&self.extra_roots) {
            for transient in &self.transient_dirs {
                remove_dir_if_present(&root.join(transient))?;
            }
        }
        if self.scoped {
            remove_dir_if_present(&self.dir)?;
        }
        Ok(())
    }
}

fn remove_dir_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed transient directory");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
