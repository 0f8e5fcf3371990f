//! Anomaly event models

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::{EntityId, InvalidChoice};

/// How serious a detected anomaly is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| InvalidChoice::new(s))
    }
}

impl TryFrom<String> for Severity {
    type Error = InvalidChoice;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Input for recording an anomaly flagged on a plot.
///
/// Produced by the external detection pipeline. The event timestamp is
/// assigned by the database at insert time. `model_confidence` is expected
/// to fall in `[0, 1]` but is stored as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewAnomalyEvent {
    pub plot: EntityId,
    #[validate(
        custom = "crate::validation::not_blank",
        length(max = 100, message = "Ensure this field has no more than 100 characters.")
    )]
    pub anomaly_type: String,
    pub severity: Severity,
    #[validate(custom = "crate::validation::finite")]
    pub model_confidence: f64,
}
