//! Estimator trait and the artifact's estimator section

use crate::error::{ArtifactError, InferenceError};
use crate::models::forest::{RandomForest, Tree};
use crate::models::linear::LogisticRegression;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A fitted classifier producing class probabilities for one row.
pub trait Estimator: Send + Sync {
    /// Estimator family name as written in the artifact
    fn kind(&self) -> &'static str;

    /// Frame columns consumed, in input order
    fn features(&self) -> &[String];

    /// Class probabilities, one per artifact class
    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, InferenceError>;
}

/// Estimator section of a model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EstimatorSpec {
    RandomForest {
        features: Vec<String>,
        trees: Vec<Tree>,
    },
    LogisticRegression {
        features: Vec<String>,
        coefficients: Vec<f64>,
        intercept: f64,
    },
    #[cfg(feature = "onnx")]
    Onnx {
        features: Vec<String>,
        /// Model file, relative to the artifact's directory
        file: String,
    },
}

impl EstimatorSpec {
    /// Estimator families this binary can resolve
    #[cfg(not(feature = "onnx"))]
    pub const NAMES: &'static [&'static str] = &["random_forest", "logistic_regression"];

    /// Estimator families this binary can resolve
    #[cfg(feature = "onnx")]
    pub const NAMES: &'static [&'static str] = &["random_forest", "logistic_regression", "onnx"];

    /// Validate the fitted parameters and build the runnable estimator.
    ///
    /// `base_dir` is the directory holding the artifact, used to resolve
    /// companion files.
    #[cfg_attr(not(feature = "onnx"), allow(unused_variables))]
    pub fn build(
        self,
        n_classes: usize,
        base_dir: &Path,
        onnx_threads: usize,
    ) -> Result<Box<dyn Estimator>, ArtifactError> {
        match self {
            EstimatorSpec::RandomForest { features, trees } => {
                Ok(Box::new(RandomForest::new(features, trees, n_classes)?))
            }
            EstimatorSpec::LogisticRegression {
                features,
                coefficients,
                intercept,
            } => {
                if n_classes != 2 {
                    return Err(ArtifactError::Invalid(format!(
                        "logistic_regression needs 2 classes, artifact has {}",
                        n_classes
                    )));
                }
                Ok(Box::new(LogisticRegression::new(
                    features,
                    coefficients,
                    intercept,
                )?))
            }
            #[cfg(feature = "onnx")]
            EstimatorSpec::Onnx { features, file } => {
                let model = crate::models::onnx::OnnxClassifier::load(
                    base_dir.join(file),
                    features,
                    n_classes,
                    onnx_threads,
                )?;
                Ok(Box::new(model))
            }
        }
    }
}
