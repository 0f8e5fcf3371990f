//! Anomaly event service
//!
//! Events are produced by an external detection pipeline. This service
//! records them as given and lists them; it never derives one itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use shared::{validated, EntityId, NewAnomalyEvent, Severity};

use crate::error::{AppError, AppResult};
use crate::services::query::{optional_id, ListQuery};

const SELECT_ANOMALIES: &str =
    "SELECT id, timestamp, plot_id, anomaly_type, severity, model_confidence FROM anomaly_events";
const ANOMALY_ORDER: &str = "timestamp DESC, id DESC";

/// Anomaly service
#[derive(Clone)]
pub struct AnomalyService {
    db: PgPool,
}

/// Anomaly event as stored and as sent over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AnomalyEvent {
    pub id: EntityId,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "plot")]
    pub plot_id: EntityId,
    pub anomaly_type: String,
    #[sqlx(try_from = "String")]
    pub severity: Severity,
    pub model_confidence: f64,
}

impl std::fmt::Display for AnomalyEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) on plot {} at {}",
            self.anomaly_type, self.severity, self.plot_id, self.timestamp
        )
    }
}

/// Query parameters accepted by the anomaly list
#[derive(Debug, Default, Deserialize)]
pub struct AnomalyFilter {
    #[serde(default, deserialize_with = "optional_id")]
    pub plot: Option<EntityId>,
}

impl AnomalyService {
    /// Create a new AnomalyService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List anomalies newest first, optionally for one plot
    pub async fn list_anomalies(&self, filter: &AnomalyFilter) -> AppResult<Vec<AnomalyEvent>> {
        let mut query = ListQuery::new(SELECT_ANOMALIES, ANOMALY_ORDER)
            .filter("plot_id", filter.plot)
            .build();
        let anomalies = query
            .build_query_as::<AnomalyEvent>()
            .fetch_all(&self.db)
            .await?;

        tracing::debug!(count = anomalies.len(), ?filter, "Listed anomalies");
        Ok(anomalies)
    }

    /// Record an anomaly; its timestamp is assigned by the database
    pub async fn record_anomaly(&self, input: NewAnomalyEvent) -> AppResult<AnomalyEvent> {
        let input = validated(input)?;

        if !(0.0..=1.0).contains(&input.model_confidence) {
            tracing::warn!(
                plot_id = input.plot,
                confidence = input.model_confidence,
                "Model confidence outside [0, 1]; storing as given"
            );
        }

        let anomaly = sqlx::query_as::<_, AnomalyEvent>(
            r#"
            INSERT INTO anomaly_events (plot_id, anomaly_type, severity, model_confidence)
            VALUES ($1, $2, $3, $4)
            RETURNING id, timestamp, plot_id, anomaly_type, severity, model_confidence
            "#,
        )
        .bind(input.plot)
        .bind(input.anomaly_type.trim())
        .bind(input.severity.as_str())
        .bind(input.model_confidence)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_insert(e, "plot", input.plot))?;

        tracing::info!(anomaly_id = anomaly.id, "Recorded {}", anomaly);
        Ok(anomaly)
    }
}
