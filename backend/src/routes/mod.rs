//! Route definitions for the farm monitoring API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
///
/// Everything is readable without credentials; only ingesting a sensor
/// reading requires a bearer token.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Farm and plot metadata (public, read-only)
        .route("/farms/", get(handlers::list_farms))
        .route("/plots/", get(handlers::list_plots))
        // Sensor readings (public list, protected ingest)
        .route("/sensor-readings/", sensor_reading_routes(state))
        // Detection output (public, read-only)
        .route("/anomalies/", get(handlers::list_anomalies))
        .route("/recommendations/", get(handlers::list_recommendations))
}

/// GET is public; POST runs behind the auth middleware
fn sensor_reading_routes(state: &AppState) -> axum::routing::MethodRouter<AppState> {
    get(handlers::list_readings).merge(
        post(handlers::create_reading).route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        )),
    )
}
