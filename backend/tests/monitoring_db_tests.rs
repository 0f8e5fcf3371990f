//! Database-backed tests for listing, filtering, cascades and ingestion
//!
//! These run against the PostgreSQL database named by `TEST_DATABASE_URL`
//! and are skipped when it is not set. Every test creates its own farm under
//! a fresh owner id, so tests can share one database and run in parallel.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio_test::{assert_err, assert_ok};
use tower::ServiceExt;
use uuid::Uuid;

use farm_monitor::{
    config::{Config, DatabaseConfig, JwtConfig, ServerConfig},
    create_app,
    middleware::Claims,
    services::{
        anomaly::{AnomalyEvent, AnomalyFilter},
        farm::FarmProfile,
        plot::{FieldPlot, PlotFilter},
        recommendation::RecommendationFilter,
        sensor_reading::ReadingFilter,
        AnomalyService, FarmService, PlotService, RecommendationService, SensorReadingService,
    },
    AppError, AppState,
};
use shared::{
    NewAgentRecommendation, NewAnomalyEvent, NewFarmProfile, NewFieldPlot, NewSensorReading,
    SensorType, Severity,
};

const SECRET: &str = "db-test-secret";

// ============================================================================
// Fixtures
// ============================================================================

async fn test_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping database test");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("failed to connect to TEST_DATABASE_URL");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");
    Some(pool)
}

fn app(pool: &PgPool) -> Router {
    let config = Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 5,
            min_connections: 0,
            run_migrations: false,
        },
        jwt: JwtConfig {
            secret: SECRET.to_string(),
            leeway_seconds: 0,
        },
    };
    create_app(AppState {
        db: pool.clone(),
        config: Arc::new(config),
    })
}

fn bearer() -> String {
    let claims = Claims::for_user(Uuid::new_v4(), Duration::minutes(5));
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

async fn create_farm(pool: &PgPool, owner: Uuid, location: &str) -> FarmProfile {
    FarmService::new(pool.clone())
        .create_farm(NewFarmProfile {
            owner,
            location: location.to_string(),
            size: 12.5,
            crop_type: "maize".to_string(),
        })
        .await
        .unwrap()
}

async fn create_plot(pool: &PgPool, farm: &FarmProfile, variety: &str) -> FieldPlot {
    PlotService::new(pool.clone())
        .create_plot(NewFieldPlot {
            farm: farm.id,
            crop_variety: variety.to_string(),
        })
        .await
        .unwrap()
}

async fn record_anomaly(pool: &PgPool, plot: &FieldPlot, anomaly_type: &str) -> AnomalyEvent {
    AnomalyService::new(pool.clone())
        .record_anomaly(NewAnomalyEvent {
            plot: plot.id,
            anomaly_type: anomaly_type.to_string(),
            severity: Severity::Medium,
            model_confidence: 0.75,
        })
        .await
        .unwrap()
}

fn reading(plot: &FieldPlot, hour: u32, value: f64) -> NewSensorReading {
    NewSensorReading {
        timestamp: Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
        plot: plot.id,
        sensor_type: SensorType::Temperature,
        value,
        source: "simulator".to_string(),
    }
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(app: Router, auth: Option<String>, body: Value) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/sensor-readings/")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn readings_for(pool: &PgPool, plot: &FieldPlot) -> usize {
    SensorReadingService::new(pool.clone())
        .list_readings(&ReadingFilter {
            plot: Some(plot.id),
        })
        .await
        .unwrap()
        .len()
}

// ============================================================================
// Ordering and filtering
// ============================================================================

#[tokio::test]
async fn test_farms_of_one_owner_are_ordered_by_location() {
    let Some(pool) = test_pool().await else { return };
    let owner = Uuid::new_v4();
    for location in ["Villa Rica", "Antigua", "Monteverde"] {
        create_farm(&pool, owner, location).await;
    }

    let farms = FarmService::new(pool.clone()).list_farms().await.unwrap();
    let locations: Vec<&str> = farms
        .iter()
        .filter(|f| f.owner_id == owner)
        .map(|f| f.location.as_str())
        .collect();

    assert_eq!(locations, vec!["Antigua", "Monteverde", "Villa Rica"]);
}

#[tokio::test]
async fn test_plots_are_filtered_by_farm_and_ordered_by_id() {
    let Some(pool) = test_pool().await else { return };
    let owner = Uuid::new_v4();
    let farm = create_farm(&pool, owner, "North").await;
    let other = create_farm(&pool, owner, "South").await;
    let first = create_plot(&pool, &farm, "B73").await;
    create_plot(&pool, &other, "Mo17").await;
    let second = create_plot(&pool, &farm, "Oh43").await;

    let plots = PlotService::new(pool.clone())
        .list_plots(&PlotFilter {
            farm: Some(farm.id),
        })
        .await
        .unwrap();

    let ids: Vec<i64> = plots.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[tokio::test]
async fn test_filter_without_matches_is_an_empty_success() {
    let Some(pool) = test_pool().await else { return };
    let farm = create_farm(&pool, Uuid::new_v4(), "Empty").await;

    let (status, body) = get_json(app(&pool), &format!("/api/plots/?farm={}", farm.id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_readings_are_listed_newest_first() {
    let Some(pool) = test_pool().await else { return };
    let farm = create_farm(&pool, Uuid::new_v4(), "Ordering").await;
    let plot = create_plot(&pool, &farm, "Test").await;
    let service = SensorReadingService::new(pool.clone());
    for (hour, value) in [(8, 18.0), (14, 27.5), (11, 23.1)] {
        service.ingest(reading(&plot, hour, value)).await.unwrap();
    }

    let (status, body) =
        get_json(app(&pool), &format!("/api/sensor-readings/?plot={}", plot.id)).await;

    assert_eq!(status, StatusCode::OK);
    let values: Vec<f64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["value"].as_f64().unwrap())
        .collect();
    assert_eq!(values, vec![27.5, 23.1, 18.0]);
    assert_eq!(body[0]["plot"], plot.id);
    assert_eq!(body[0]["timestamp"], "2024-06-01T14:00:00Z");
}

#[tokio::test]
async fn test_anomalies_are_listed_newest_first() {
    let Some(pool) = test_pool().await else { return };
    let farm = create_farm(&pool, Uuid::new_v4(), "Anomalies").await;
    let plot = create_plot(&pool, &farm, "Test").await;
    let older = record_anomaly(&pool, &plot, "soil_dry").await;
    let newer = record_anomaly(&pool, &plot, "heat_stress").await;

    let anomalies = AnomalyService::new(pool.clone())
        .list_anomalies(&AnomalyFilter {
            plot: Some(plot.id),
        })
        .await
        .unwrap();

    let ids: Vec<i64> = anomalies.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}

#[tokio::test]
async fn test_recommendations_filter_by_plot_through_anomaly() {
    let Some(pool) = test_pool().await else { return };
    let farm = create_farm(&pool, Uuid::new_v4(), "Recommendations").await;
    let plot_a = create_plot(&pool, &farm, "A").await;
    let plot_b = create_plot(&pool, &farm, "B").await;
    let anomaly_a = record_anomaly(&pool, &plot_a, "soil_dry").await;
    let anomaly_b = record_anomaly(&pool, &plot_b, "soil_dry").await;

    let service = RecommendationService::new(pool.clone());
    let mut created = Vec::new();
    for anomaly in [&anomaly_a, &anomaly_b, &anomaly_a] {
        let recommendation = service
            .record_recommendation(NewAgentRecommendation {
                anomaly_event: anomaly.id,
                recommended_action: "Irrigate".to_string(),
                explanation_text: "Moisture below threshold".to_string(),
                confidence: 0.6,
            })
            .await
            .unwrap();
        created.push(recommendation);
    }

    let by_plot = service
        .list_recommendations(&RecommendationFilter {
            anomaly: None,
            plot: Some(plot_a.id),
        })
        .await
        .unwrap();
    let ids: Vec<i64> = by_plot.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![created[2].id, created[0].id]);

    // Both filters must hold
    let mismatched = service
        .list_recommendations(&RecommendationFilter {
            anomaly: Some(anomaly_b.id),
            plot: Some(plot_a.id),
        })
        .await
        .unwrap();
    assert!(mismatched.is_empty());

    let (status, body) = get_json(
        app(&pool),
        &format!("/api/recommendations/?anomaly={}&plot={}", anomaly_b.id, plot_b.id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["anomaly_event"], anomaly_b.id);
}

// ============================================================================
// Cascades and references
// ============================================================================

#[tokio::test]
async fn test_deleting_a_farm_removes_everything_beneath_it() {
    let Some(pool) = test_pool().await else { return };
    let farm = create_farm(&pool, Uuid::new_v4(), "Doomed").await;
    let plot = create_plot(&pool, &farm, "Test").await;
    SensorReadingService::new(pool.clone())
        .ingest(reading(&plot, 9, 20.0))
        .await
        .unwrap();
    let anomaly = record_anomaly(&pool, &plot, "soil_dry").await;
    RecommendationService::new(pool.clone())
        .record_recommendation(NewAgentRecommendation {
            anomaly_event: anomaly.id,
            recommended_action: "Irrigate".to_string(),
            explanation_text: "Dry".to_string(),
            confidence: 0.9,
        })
        .await
        .unwrap();

    let farms = FarmService::new(pool.clone());
    assert_ok!(farms.delete_farm(farm.id).await);

    let plots = PlotService::new(pool.clone())
        .list_plots(&PlotFilter {
            farm: Some(farm.id),
        })
        .await
        .unwrap();
    assert!(plots.is_empty());
    assert_eq!(readings_for(&pool, &plot).await, 0);
    let anomalies = AnomalyService::new(pool.clone())
        .list_anomalies(&AnomalyFilter {
            plot: Some(plot.id),
        })
        .await
        .unwrap();
    assert!(anomalies.is_empty());
    let recommendations = RecommendationService::new(pool.clone())
        .list_recommendations(&RecommendationFilter {
            anomaly: Some(anomaly.id),
            plot: None,
        })
        .await
        .unwrap();
    assert!(recommendations.is_empty());

    let err = assert_err!(farms.delete_farm(farm.id).await);
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_plot_for_missing_farm_is_a_field_error() {
    let Some(pool) = test_pool().await else { return };

    let result = PlotService::new(pool.clone())
        .create_plot(NewFieldPlot {
            farm: i64::MAX,
            crop_variety: "Orphan".to_string(),
        })
        .await;

    match assert_err!(result) {
        AppError::Validation(fields) => assert!(fields.contains("farm")),
        other => panic!("expected a validation error, got {:?}", other),
    }
}

// ============================================================================
// Ingestion over HTTP
// ============================================================================

#[tokio::test]
async fn test_post_echoes_created_reading() {
    let Some(pool) = test_pool().await else { return };
    let farm = create_farm(&pool, Uuid::new_v4(), "Ingest").await;
    let plot = create_plot(&pool, &farm, "Test").await;

    let (status, body) = post_json(
        app(&pool),
        Some(bearer()),
        json!({
            "id": 999999,
            "timestamp": "2024-06-02T07:30:00Z",
            "plot": plot.id,
            "sensor_type": "humidity",
            "value": 64.2
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["plot"], plot.id);
    assert_eq!(body["sensor_type"], "humidity");
    assert_eq!(body["source"], "simulator");

    let (_, listed) =
        get_json(app(&pool), &format!("/api/sensor-readings/?plot={}", plot.id)).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], body["id"]);
    assert_ne!(body["id"], 999999);
}

#[tokio::test]
async fn test_rejected_posts_persist_nothing() {
    let Some(pool) = test_pool().await else { return };
    let farm = create_farm(&pool, Uuid::new_v4(), "Rejected").await;
    let plot = create_plot(&pool, &farm, "Test").await;
    let valid = json!({
        "timestamp": "2024-06-02T07:30:00Z",
        "plot": plot.id,
        "sensor_type": "moisture",
        "value": 33.0
    });

    let (status, _) = post_json(app(&pool), None, valid).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = post_json(
        app(&pool),
        Some(bearer()),
        json!({
            "timestamp": "2024-06-02T07:30:00Z",
            "plot": plot.id,
            "sensor_type": "wind",
            "value": 33.0
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["fields"]["sensor_type"].is_array());

    assert_eq!(readings_for(&pool, &plot).await, 0);
}

#[tokio::test]
async fn test_post_for_missing_plot_is_rejected_on_plot() {
    let Some(pool) = test_pool().await else { return };

    let (status, body) = post_json(
        app(&pool),
        Some(bearer()),
        json!({
            "timestamp": "2024-06-02T07:30:00Z",
            "plot": i64::MAX,
            "sensor_type": "temperature",
            "value": 21.0
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["fields"]["plot"][0],
        format!("Invalid pk \"{}\" - object does not exist.", i64::MAX)
    );
}
