//! Sensor reading service: ingestion and newest-first listing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use shared::{validated, EntityId, NewSensorReading, SensorType};

use crate::error::{AppError, AppResult};
use crate::services::query::{optional_id, ListQuery};

const SELECT_READINGS: &str =
    "SELECT id, timestamp, plot_id, sensor_type, value, source FROM sensor_readings";
const READING_ORDER: &str = "timestamp DESC, id DESC";

/// Sensor reading service
#[derive(Clone)]
pub struct SensorReadingService {
    db: PgPool,
}

/// Sensor reading as stored and as sent over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SensorReading {
    pub id: EntityId,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "plot")]
    pub plot_id: EntityId,
    #[sqlx(try_from = "String")]
    pub sensor_type: SensorType,
    pub value: f64,
    pub source: String,
}

impl std::fmt::Display for SensorReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}={} on plot {} at {}",
            self.sensor_type, self.value, self.plot_id, self.timestamp
        )
    }
}

/// Query parameters accepted by the reading list
#[derive(Debug, Default, Deserialize)]
pub struct ReadingFilter {
    #[serde(default, deserialize_with = "optional_id")]
    pub plot: Option<EntityId>,
}

impl SensorReadingService {
    /// Create a new SensorReadingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List readings newest first, optionally for one plot
    pub async fn list_readings(&self, filter: &ReadingFilter) -> AppResult<Vec<SensorReading>> {
        let mut query = ListQuery::new(SELECT_READINGS, READING_ORDER)
            .filter("plot_id", filter.plot)
            .build();
        let readings = query
            .build_query_as::<SensorReading>()
            .fetch_all(&self.db)
            .await?;

        tracing::debug!(count = readings.len(), ?filter, "Listed sensor readings");
        Ok(readings)
    }

    /// Store one reading and return it with its assigned id.
    ///
    /// A reference to a plot that does not exist is reported on `plot`.
    pub async fn ingest(&self, input: NewSensorReading) -> AppResult<SensorReading> {
        let input = validated(input)?;

        let reading = sqlx::query_as::<_, SensorReading>(
            r#"
            INSERT INTO sensor_readings (timestamp, plot_id, sensor_type, value, source)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, timestamp, plot_id, sensor_type, value, source
            "#,
        )
        .bind(input.timestamp)
        .bind(input.plot)
        .bind(input.sensor_type.as_str())
        .bind(input.value)
        .bind(&input.source)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_insert(e, "plot", input.plot))?;

        tracing::info!(reading_id = reading.id, "Ingested {}", reading);
        Ok(reading)
    }
}
