//! Type definitions for the prediction API

pub mod customer;
pub mod prediction;

pub use customer::CustomerRecord;
pub use prediction::{HealthResponse, ModelInfo, PredictionResponse};
