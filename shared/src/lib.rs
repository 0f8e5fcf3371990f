//! Shared types and models for the farm monitoring service
//!
//! This crate holds the domain enums, creation inputs and payload validation
//! used by the backend and by any pipeline that records anomalies or
//! recommendations against it.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
