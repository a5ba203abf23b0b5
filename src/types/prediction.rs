//! Response bodies returned by the API

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PREDICTION_DESCRIPTION: &str =
    "Probability of subscribing ('yes') or not subscribing ('no') to the term deposit.";

/// Outcome of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PredictionResponse {
    /// Predicted class label
    pub prediction: String,
    /// Probability of the positive class (0.0 - 1.0)
    pub probability: f64,
    /// Probability per class label
    pub prediction_probability: BTreeMap<String, f64>,
    /// Decision threshold applied to `probability`
    pub threshold_used: f64,
    /// Version of the model artifact that produced this prediction
    pub model_version: String,
    pub description: String,
}

/// Service status reported by `GET /`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub api_version: String,
    pub model_name: String,
    pub model_version: String,
    pub loaded_at: DateTime<Utc>,
}

/// Artifact metadata reported by `GET /model-info`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub classes: Vec<String>,
    pub threshold: f64,
    pub estimator: String,
    pub features: Vec<String>,
    pub preprocessing: Vec<String>,
}
