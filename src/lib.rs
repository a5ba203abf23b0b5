//! Term Deposit Prediction API
//!
//! Serves a single pre-fitted classifier that predicts whether a bank
//! customer will subscribe to a term deposit. The model artifact is loaded
//! once at startup and shared read-only by every request.

pub mod api;
pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod logging;
pub mod models;
pub mod types;

pub use config::AppConfig;
pub use error::{ApiError, ArtifactError, InferenceError, ValidationError};
pub use feature_extractor::FeatureExtractor;
pub use models::inference::InferenceEngine;
pub use types::{customer::CustomerRecord, prediction::PredictionResponse};
