//! Domain models for the farm monitoring service

mod anomaly;
mod farm;
mod plot;
mod recommendation;
mod sensor;

pub use anomaly::*;
pub use farm::*;
pub use plot::*;
pub use recommendation::*;
pub use sensor::*;
