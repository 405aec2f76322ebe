//! Order statistics over stage durations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// How repeated runs in a group collapse to one duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Median across runs (mean of the two middle values for even counts).
    #[default]
    Median,
    /// Fastest run.
    Min,
}

impl Aggregation {
    /// Apply the aggregation. Returns `None` for an empty slice.
    #[must_use]
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        match self {
            Self::Median => median(values),
            Self::Min => values.iter().copied().min_by(f64::total_cmp),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Median => "median",
            Self::Min => "min",
        })
    }
}

impl FromStr for Aggregation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "median" => Ok(Self::Median),
            "min" => Ok(Self::Min),
            other => Err(Error::Other(format!(
                "Unknown aggregation '{other}' (expected 'median' or 'min')"
            ))),
        }
    }
}

/// Median of `values`, or `None` if empty.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
