//! Anomaly event HTTP handlers (read-only)

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::IntoResponse,
    Json,
};

use crate::error::AppError;
use crate::services::anomaly::{AnomalyFilter, AnomalyService};
use crate::AppState;

/// List anomalies newest first, optionally only those of `?plot=<id>`
pub async fn list_anomalies(
    State(state): State<AppState>,
    filter: Result<Query<AnomalyFilter>, QueryRejection>,
) -> impl IntoResponse {
    let Query(filter) = match filter {
        Ok(filter) => filter,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };
    let service = AnomalyService::new(state.db.clone());

    match service.list_anomalies(&filter).await {
        Ok(anomalies) => Json(anomalies).into_response(),
        Err(e) => e.into_response(),
    }
}
