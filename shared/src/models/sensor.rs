//! Sensor reading models

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::{EntityId, InvalidChoice};

/// Source recorded when a reading does not name one
pub const DEFAULT_SOURCE: &str = "simulator";

/// Kinds of sensors attached to a plot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorType {
    /// Soil moisture
    Moisture,
    /// Air temperature
    Temperature,
    Humidity,
}

impl SensorType {
    pub const ALL: [SensorType; 3] = [
        SensorType::Moisture,
        SensorType::Temperature,
        SensorType::Humidity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Moisture => "moisture",
            SensorType::Temperature => "temperature",
            SensorType::Humidity => "humidity",
        }
    }
}

impl std::fmt::Display for SensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorType {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensorType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| InvalidChoice::new(s))
    }
}

impl TryFrom<String> for SensorType {
    type Error = InvalidChoice;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Input for ingesting one sensor reading
///
/// The timestamp is the measurement time reported by the caller; the server
/// never overrides it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewSensorReading {
    pub timestamp: DateTime<Utc>,
    pub plot: EntityId,
    pub sensor_type: SensorType,
    #[validate(custom = "crate::validation::finite")]
    pub value: f64,
    #[validate(
        custom = "crate::validation::not_blank",
        length(max = 50, message = "Ensure this field has no more than 50 characters.")
    )]
    pub source: String,
}
