//! HTTP handlers for the farm monitoring API

pub mod anomaly;
pub mod farm;
pub mod health;
pub mod plot;
pub mod recommendation;
pub mod sensor_reading;

pub use anomaly::*;
pub use farm::*;
pub use health::*;
pub use plot::*;
pub use recommendation::*;
pub use sensor_reading::*;
