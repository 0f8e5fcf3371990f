//! Sensor reading HTTP handlers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::Value;

use shared::parse_sensor_reading;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::sensor_reading::{ReadingFilter, SensorReadingService};
use crate::AppState;

/// List readings newest first, optionally only those of `?plot=<id>`
pub async fn list_readings(
    State(state): State<AppState>,
    filter: Result<Query<ReadingFilter>, QueryRejection>,
) -> impl IntoResponse {
    let Query(filter) = match filter {
        Ok(filter) => filter,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };
    let service = SensorReadingService::new(state.db.clone());

    match service.list_readings(&filter).await {
        Ok(readings) => Json(readings).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Ingest one reading. Runs behind the auth middleware.
pub async fn create_reading(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> impl IntoResponse {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };

    let input = match parse_sensor_reading(&body) {
        Ok(input) => input,
        Err(errors) => return AppError::from(errors).into_response(),
    };

    tracing::debug!(
        user_id = %current_user.0.user_id,
        plot_id = input.plot,
        "Ingesting sensor reading"
    );

    let service = SensorReadingService::new(state.db.clone());
    match service.ingest(input).await {
        Ok(reading) => (StatusCode::CREATED, Json(reading)).into_response(),
        Err(e) => e.into_response(),
    }
}
