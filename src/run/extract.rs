//! Result extractor: slice the metrics section out of a captured output file.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::Result;

/// Literal marker the benchmark program prints before its metrics table.
pub const RESULTS_MARKER: &str = "Results:";

/// What extraction found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The marker was found and everything from it onward was written.
    Extracted {
        /// File the section was written to.
        results_file: PathBuf,
        /// Number of lines written, marker line included.
        lines: usize,
    },
    /// No marker in the output; no results file was written.
    MissingMarker,
}

impl Extraction {
    /// Whether a results file was produced.
    #[must_use]
    pub const fn is_extracted(&self) -> bool {
        matches!(self, Self::Extracted { .. })
    }
}

/// Byte offset of the start of the first line containing [`RESULTS_MARKER`].
#[must_use]
pub fn find_results_section(output: &[u8]) -> Option<usize> {
    let marker = RESULTS_MARKER.as_bytes();
    let mut start = 0;
    for line in output.split(|&b| b == b'\n') {
        if line.windows(marker.len()).any(|w| w == marker) {
            return Some(start);
        }
        start += line.len() + 1;
    }
    None
}

/// Copy every line from the `Results:` marker to end-of-file of
/// `output_file` into `results_file`.
///
/// The output file is only read, so re-running over the same output
/// produces an identical results file.
///
/// # Errors
///
/// Returns an error if the output file cannot be read or the results file
/// cannot be written. A missing marker is not an error.
pub fn extract_results(output_file: &Path, results_file: &Path) -> Result<Extraction> {
    let output = std::fs::read(output_file)?;

    let Some(start) = find_results_section(&output) else {
        warn!(
            output = %output_file.display(),
            "no '{RESULTS_MARKER}' marker in output; the run likely failed"
        );
        return Ok(Extraction::MissingMarker);
    };

    let section = &output[start..];
    if let Some(parent) = results_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(results_file, section)?;

    let lines = section.split(|&b| b == b'\n').filter(|l| !l.is_empty()).count();
    info!(results = %results_file.display(), lines, "extracted results");

    Ok(Extraction::Extracted {
        results_file: results_file.to_path_buf(),
        lines,
    })
}
