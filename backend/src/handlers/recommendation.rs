//! Agent recommendation HTTP handlers (read-only)

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::IntoResponse,
    Json,
};

use crate::error::AppError;
use crate::services::recommendation::{RecommendationFilter, RecommendationService};
use crate::AppState;

/// List recommendations newest first.
///
/// `?anomaly=<id>` and `?plot=<id>` may be combined; `plot` matches the plot
/// of the anomaly a recommendation was made for.
pub async fn list_recommendations(
    State(state): State<AppState>,
    filter: Result<Query<RecommendationFilter>, QueryRejection>,
) -> impl IntoResponse {
    let Query(filter) = match filter {
        Ok(filter) => filter,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };
    let service = RecommendationService::new(state.db.clone());

    match service.list_recommendations(&filter).await {
        Ok(recommendations) => Json(recommendations).into_response(),
        Err(e) => e.into_response(),
    }
}
