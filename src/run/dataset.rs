//! The fixed set of TabArena datasets the benchmark loops over.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A benchmark dataset, named as TabArena names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dataset {
    /// `anneal`
    #[serde(rename = "anneal")]
    Anneal,
    /// `customer_satisfaction_in_airline`
    #[serde(rename = "customer_satisfaction_in_airline")]
    CustomerSatisfactionInAirline,
    /// `credit-g`
    #[serde(rename = "credit-g")]
    CreditG,
    /// `diabetes`
    #[serde(rename = "diabetes")]
    Diabetes,
    /// `blood-transfusion-service-center`
    #[serde(rename = "blood-transfusion-service-center")]
    BloodTransfusionServiceCenter,
}

impl Dataset {
    /// Every dataset, in benchmark loop order.
    pub const ALL: [Self; 5] = [
        Self::Anneal,
        Self::CustomerSatisfactionInAirline,
        Self::CreditG,
        Self::Diabetes,
        Self::BloodTransfusionServiceCenter,
    ];

    /// The dataset name passed to `--datasets`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Anneal => "anneal",
            Self::CustomerSatisfactionInAirline => "customer_satisfaction_in_airline",
            Self::CreditG => "credit-g",
            Self::Diabetes => "diabetes",
            Self::BloodTransfusionServiceCenter => "blood-transfusion-service-center",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|d| d.name()).collect();
                Error::Other(format!(
                    "Unknown dataset '{s}' (expected one of: {})",
                    known.join(", ")
                ))
            })
    }
}
