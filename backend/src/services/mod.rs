//! Persistence services for the farm monitoring service

pub mod anomaly;
pub mod farm;
pub mod plot;
pub mod query;
pub mod recommendation;
pub mod sensor_reading;

pub use anomaly::AnomalyService;
pub use farm::FarmService;
pub use plot::PlotService;
pub use recommendation::RecommendationService;
pub use sensor_reading::SensorReadingService;
