//! Farm profile HTTP handlers

use axum::{extract::State, response::IntoResponse, Json};

use crate::services::FarmService;
use crate::AppState;

/// List all farms ordered by owner and location
pub async fn list_farms(State(state): State<AppState>) -> impl IntoResponse {
    let service = FarmService::new(state.db.clone());

    match service.list_farms().await {
        Ok(farms) => Json(farms).into_response(),
        Err(e) => e.into_response(),
    }
}
