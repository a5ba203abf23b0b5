//! Binary logistic regression

use crate::error::{ArtifactError, InferenceError};
use crate::models::estimator::Estimator;

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    features: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn new(
        features: Vec<String>,
        coefficients: Vec<f64>,
        intercept: f64,
    ) -> Result<Self, ArtifactError> {
        if features.is_empty() {
            return Err(ArtifactError::Invalid(
                "logistic_regression has no features".into(),
            ));
        }
        if coefficients.len() != features.len() {
            return Err(ArtifactError::Invalid(format!(
                "logistic_regression has {} coefficients for {} features",
                coefficients.len(),
                features.len()
            )));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ArtifactError::Invalid(
                "logistic_regression parameters must be finite".into(),
            ));
        }
        Ok(Self {
            features,
            coefficients,
            intercept,
        })
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Estimator for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn features(&self) -> &[String] {
        &self.features
    }

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, InferenceError> {
        if features.len() != self.coefficients.len() {
            return Err(InferenceError::OutputShape {
                found: features.len(),
                expected: self.coefficients.len(),
            });
        }
        let z = self
            .coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (w, x)| acc + w * (*x as f64));
        let p = sigmoid(z);
        Ok(vec![1.0 - p, p])
    }
}
