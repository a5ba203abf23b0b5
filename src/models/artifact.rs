//! On-disk model artifact layout

use crate::error::ArtifactError;
use crate::models::estimator::EstimatorSpec;
use crate::models::preprocess::Preprocessor;
use serde::{Deserialize, Serialize};

/// Artifact format understood by this binary
pub const FORMAT_VERSION: u32 = 1;

fn default_threshold() -> f64 {
    0.5
}

/// Serialized pre-fitted pipeline: preprocessing steps plus estimator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub format_version: u32,
    pub name: String,
    pub version: String,
    /// Class labels; index 1 is the positive class
    pub classes: Vec<String>,
    /// Decision threshold on the positive-class probability
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub preprocessor: Preprocessor,
    pub estimator: EstimatorSpec,
}

impl ArtifactFile {
    /// Checks that do not depend on the estimator family
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.format_version != FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: self.format_version,
                expected: FORMAT_VERSION,
            });
        }
        if self.name.trim().is_empty() {
            return Err(ArtifactError::Invalid("artifact name is empty".into()));
        }
        if self.classes.len() != 2 {
            return Err(ArtifactError::Invalid(format!(
                "expected 2 classes, found {}",
                self.classes.len()
            )));
        }
        if self.classes[0] == self.classes[1] {
            return Err(ArtifactError::Invalid("class labels must differ".into()));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ArtifactError::Invalid(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        self.preprocessor.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(extra: &str) -> String {
        format!(
            r#"{{
                "format_version": 1,
                "name": "tiny",
                "version": "0.1.0",
                "classes": ["no", "yes"],
                {}
                "estimator": {{
                    "type": "logistic_regression",
                    "features": ["age"],
                    "coefficients": [0.01],
                    "intercept": -1.0
                }}
            }}"#,
            extra
        )
    }

    #[test]
    fn test_defaults() {
        let file: ArtifactFile = serde_json::from_str(&artifact("")).unwrap();
        assert_eq!(file.threshold, 0.5);
        assert!(file.preprocessor.steps.is_empty());
        assert!(file.validate().is_ok());
    }

    #[test]
    fn test_version_mismatch() {
        let mut file: ArtifactFile = serde_json::from_str(&artifact("")).unwrap();
        file.format_version = 2;
        assert!(matches!(
            file.validate(),
            Err(ArtifactError::UnsupportedVersion { found: 2, .. })
        ));
    }

    #[test]
    fn test_threshold_range() {
        let file: ArtifactFile =
            serde_json::from_str(&artifact(r#""threshold": 1.2,"#)).unwrap();
        assert!(matches!(file.validate(), Err(ArtifactError::Invalid(_))));
    }

    #[test]
    fn test_class_count() {
        let mut file: ArtifactFile = serde_json::from_str(&artifact("")).unwrap();
        file.classes.push("maybe".into());
        assert!(file.validate().is_err());
    }
}
