//! Inference engine for term deposit prediction

use crate::config::ModelConfig;
use crate::error::{ArtifactError, InferenceError};
use crate::feature_extractor::FeatureExtractor;
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::types::customer::CustomerRecord;
use crate::types::prediction::{ModelInfo, PredictionResponse, PREDICTION_DESCRIPTION};
use std::collections::BTreeMap;
use tracing::debug;

/// Result of model inference
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// Predicted class label
    pub label: String,
    /// Positive-class probability (0.0 - 1.0)
    pub probability: f64,
    /// Probability per class, in artifact class order
    pub class_probabilities: Vec<(String, f64)>,
    /// Threshold the label was decided with
    pub threshold: f64,
}

impl PredictionResult {
    /// Convert to the API response body
    pub fn to_response(&self, model_version: &str) -> PredictionResponse {
        let prediction_probability: BTreeMap<String, f64> =
            self.class_probabilities.iter().cloned().collect();

        PredictionResponse {
            prediction: self.label.clone(),
            probability: self.probability,
            prediction_probability,
            threshold_used: self.threshold,
            model_version: model_version.to_string(),
            description: PREDICTION_DESCRIPTION.to_string(),
        }
    }
}

/// Scores customer records against the single loaded model.
///
/// Holds no mutable state; share it behind an `Arc`.
pub struct InferenceEngine {
    model: LoadedModel,
    extractor: FeatureExtractor,
}

impl InferenceEngine {
    /// Load the configured artifact and build an engine around it
    pub fn new(config: &ModelConfig) -> Result<Self, ArtifactError> {
        let model = ModelLoader::from_config(config).load(&config.path)?;
        Ok(Self::from_model(model))
    }

    /// Build an engine around an already loaded model
    pub fn from_model(model: LoadedModel) -> Self {
        Self {
            model,
            extractor: FeatureExtractor::new(),
        }
    }

    pub fn model(&self) -> &LoadedModel {
        &self.model
    }

    /// Run the full pipeline for one record
    pub fn predict(&self, record: &CustomerRecord) -> Result<PredictionResult, InferenceError> {
        let raw = self.extractor.extract(record);
        let frame = self.model.preprocessor.transform(&raw)?;
        let input = frame.to_vector(self.model.estimator.features())?;

        let probs = self.model.estimator.predict_proba(&input)?;
        if probs.len() != self.model.classes.len() {
            return Err(InferenceError::OutputShape {
                found: probs.len(),
                expected: self.model.classes.len(),
            });
        }
        if probs.iter().any(|p| !p.is_finite()) {
            return Err(InferenceError::Backend(
                "estimator produced a non-finite probability".into(),
            ));
        }

        let probability = probs[1].clamp(0.0, 1.0);
        let label = if probability >= self.model.threshold {
            self.model.classes[1].clone()
        } else {
            self.model.classes[0].clone()
        };

        let class_probabilities = self
            .model
            .classes
            .iter()
            .cloned()
            .zip(probs.iter().map(|p| p.clamp(0.0, 1.0)))
            .collect();

        debug!(
            model = %self.model.name,
            prediction = %label,
            probability = probability,
            "Inference complete"
        );

        Ok(PredictionResult {
            label,
            probability,
            class_probabilities,
            threshold: self.model.threshold,
        })
    }

    /// Metadata describing the loaded artifact
    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            name: self.model.name.clone(),
            version: self.model.version.clone(),
            classes: self.model.classes.clone(),
            threshold: self.model.threshold,
            estimator: self.model.estimator.kind().to_string(),
            features: self.model.estimator.features().to_vec(),
            preprocessing: self.model.preprocessor.step_names(),
        }
    }
}
