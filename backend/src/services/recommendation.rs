//! Agent recommendation service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use shared::{validated, EntityId, NewAgentRecommendation};

use crate::error::{AppError, AppResult};
use crate::services::query::{optional_id, ListQuery};

// The join exists only so `plot` can filter through the parent anomaly
const SELECT_RECOMMENDATIONS: &str = r#"
    SELECT r.id, r.timestamp, r.anomaly_event_id, r.recommended_action,
           r.explanation_text, r.confidence
    FROM agent_recommendations r
    JOIN anomaly_events a ON a.id = r.anomaly_event_id"#;
const RECOMMENDATION_ORDER: &str = "r.timestamp DESC, r.id DESC";

/// Recommendation service
#[derive(Clone)]
pub struct RecommendationService {
    db: PgPool,
}

/// Agent recommendation as stored and as sent over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AgentRecommendation {
    pub id: EntityId,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "anomaly_event")]
    pub anomaly_event_id: EntityId,
    pub recommended_action: String,
    pub explanation_text: String,
    pub confidence: f64,
}

impl std::fmt::Display for AgentRecommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Recommendation {} for anomaly {}",
            self.id, self.anomaly_event_id
        )
    }
}

/// Query parameters accepted by the recommendation list
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationFilter {
    #[serde(default, deserialize_with = "optional_id")]
    pub anomaly: Option<EntityId>,
    /// Plot of the parent anomaly
    #[serde(default, deserialize_with = "optional_id")]
    pub plot: Option<EntityId>,
}

impl RecommendationService {
    /// Create a new RecommendationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List recommendations newest first, filtered by anomaly and/or plot
    pub async fn list_recommendations(
        &self,
        filter: &RecommendationFilter,
    ) -> AppResult<Vec<AgentRecommendation>> {
        let mut query = ListQuery::new(SELECT_RECOMMENDATIONS, RECOMMENDATION_ORDER)
            .filter("r.anomaly_event_id", filter.anomaly)
            .filter("a.plot_id", filter.plot)
            .build();
        let recommendations = query
            .build_query_as::<AgentRecommendation>()
            .fetch_all(&self.db)
            .await?;

        tracing::debug!(count = recommendations.len(), ?filter, "Listed recommendations");
        Ok(recommendations)
    }

    /// Record a recommendation for an anomaly; its timestamp is assigned by
    /// the database
    pub async fn record_recommendation(
        &self,
        input: NewAgentRecommendation,
    ) -> AppResult<AgentRecommendation> {
        let input = validated(input)?;

        let recommendation = sqlx::query_as::<_, AgentRecommendation>(
            r#"
            INSERT INTO agent_recommendations
                (anomaly_event_id, recommended_action, explanation_text, confidence)
            VALUES ($1, $2, $3, $4)
            RETURNING id, timestamp, anomaly_event_id, recommended_action,
                      explanation_text, confidence
            "#,
        )
        .bind(input.anomaly_event)
        .bind(input.recommended_action.trim())
        .bind(input.explanation_text.trim())
        .bind(input.confidence)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_insert(e, "anomaly_event", input.anomaly_event))?;

        tracing::info!(recommendation_id = recommendation.id, "Recorded {}", recommendation);
        Ok(recommendation)
    }
}
