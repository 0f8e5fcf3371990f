//! Field plot HTTP handlers

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::IntoResponse,
    Json,
};

use crate::error::AppError;
use crate::services::plot::{PlotFilter, PlotService};
use crate::AppState;

/// List plots, optionally only those of `?farm=<id>`
pub async fn list_plots(
    State(state): State<AppState>,
    filter: Result<Query<PlotFilter>, QueryRejection>,
) -> impl IntoResponse {
    let Query(filter) = match filter {
        Ok(filter) => filter,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };
    let service = PlotService::new(state.db.clone());

    match service.list_plots(&filter).await {
        Ok(plots) => Json(plots).into_response(),
        Err(e) => e.into_response(),
    }
}
