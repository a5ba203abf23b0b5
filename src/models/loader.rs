//! Model artifact loader

use crate::config::ModelConfig;
use crate::error::ArtifactError;
use crate::feature_extractor::FeatureExtractor;
use crate::models::artifact::{ArtifactFile, FORMAT_VERSION};
use crate::models::estimator::{Estimator, EstimatorSpec};
use crate::models::frame::ColumnKind;
use crate::models::preprocess::{Preprocessor, Transformer};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Loaded artifact, immutable for the rest of the process
pub struct LoadedModel {
    /// Artifact name
    pub name: String,
    /// Artifact version
    pub version: String,
    /// File the artifact was read from
    pub path: PathBuf,
    /// Class labels; index 1 is the positive class
    pub classes: Vec<String>,
    /// Decision threshold in effect
    pub threshold: f64,
    /// Fitted preprocessing steps
    pub preprocessor: Preprocessor,
    /// Fitted estimator
    pub estimator: Box<dyn Estimator>,
    /// When the artifact finished loading
    pub loaded_at: DateTime<Utc>,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("path", &self.path)
            .field("classes", &self.classes)
            .field("threshold", &self.threshold)
            .field("steps", &self.preprocessor.step_names())
            .field("estimator", &self.estimator.kind())
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

/// Loader for model artifacts
pub struct ModelLoader {
    /// Replaces the artifact's own threshold when set
    threshold_override: Option<f64>,
    /// Number of threads for ONNX estimators
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a loader that keeps the artifact's threshold
    pub fn new() -> Self {
        Self {
            threshold_override: None,
            onnx_threads: 1,
        }
    }

    /// Create a loader from the model section of the configuration
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            threshold_override: config.threshold,
            onnx_threads: config.onnx_threads,
        }
    }

    /// Read, resolve, validate and build the artifact at `path`
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<LoadedModel, ArtifactError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading model artifact");

        let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: Value = serde_json::from_slice(&bytes)?;

        check_format_version(&raw)?;
        resolve_components(&raw)?;

        let file: ArtifactFile = serde_json::from_value(raw)?;
        file.validate()?;

        let threshold = match self.threshold_override {
            Some(t) => {
                warn!(
                    artifact_threshold = file.threshold,
                    configured_threshold = t,
                    "Overriding artifact decision threshold"
                );
                t
            }
            None => file.threshold,
        };

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let estimator = file
            .estimator
            .build(file.classes.len(), base_dir, self.onnx_threads)?;
        check_features(&file.preprocessor, estimator.features())?;

        let model = LoadedModel {
            name: file.name,
            version: file.version,
            path: path.to_path_buf(),
            classes: file.classes,
            threshold,
            preprocessor: file.preprocessor,
            estimator,
            loaded_at: Utc::now(),
        };

        info!(
            model = %model.name,
            version = %model.version,
            estimator = model.estimator.kind(),
            steps = model.preprocessor.steps.len(),
            features = model.estimator.features().len(),
            threshold = model.threshold,
            "Model artifact loaded successfully"
        );

        Ok(model)
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject other format versions before anything else reads the document,
/// since their layout may differ entirely.
fn check_format_version(raw: &Value) -> Result<(), ArtifactError> {
    // A missing or non-integer version is left to deserialisation
    let Some(found) = raw.get("format_version").and_then(Value::as_u64) else {
        return Ok(());
    };
    if found != u64::from(FORMAT_VERSION) {
        return Err(ArtifactError::UnsupportedVersion {
            found: u32::try_from(found).unwrap_or(u32::MAX),
            expected: FORMAT_VERSION,
        });
    }
    Ok(())
}

/// Every estimator input must be a numeric column the pipeline produces
fn check_features(preprocessor: &Preprocessor, features: &[String]) -> Result<(), ArtifactError> {
    let schema = preprocessor.output_schema(FeatureExtractor::new().schema())?;
    for feature in features {
        match schema.get(feature) {
            Some(ColumnKind::Numeric) => {}
            Some(ColumnKind::Categorical) => {
                return Err(ArtifactError::Invalid(format!(
                    "estimator feature `{}` is still categorical after preprocessing",
                    feature
                )))
            }
            None => {
                return Err(ArtifactError::Invalid(format!(
                    "estimator feature `{}` is not produced by preprocessing",
                    feature
                )))
            }
        }
    }
    Ok(())
}

/// Check every component the artifact names is compiled into this binary.
///
/// Runs on the raw document so an unknown component is reported as such
/// rather than as a generic schema mismatch.
fn resolve_components(raw: &Value) -> Result<(), ArtifactError> {
    let steps = raw
        .pointer("/preprocessor/steps")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for step in steps {
        if let Some(name) = step.get("type").and_then(Value::as_str) {
            if !Transformer::NAMES.contains(&name) {
                return Err(ArtifactError::UnresolvedComponent {
                    kind: "preprocessing component",
                    name: name.to_string(),
                });
            }
        }
    }

    if let Some(name) = raw.pointer("/estimator/type").and_then(Value::as_str) {
        if !EstimatorSpec::NAMES.contains(&name) {
            return Err(ArtifactError::UnresolvedComponent {
                kind: "estimator",
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_artifact(dir: &Path, body: &Value) -> PathBuf {
        let path = dir.join("model.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.to_string().as_bytes()).unwrap();
        path
    }

    fn tiny_artifact() -> Value {
        json!({
            "format_version": 1,
            "name": "tiny",
            "version": "0.1.0",
            "classes": ["no", "yes"],
            "threshold": 0.5,
            "preprocessor": {"steps": [
                {"type": "one_hot", "column": "loan", "categories": ["no", "yes"]}
            ]},
            "estimator": {
                "type": "random_forest",
                "features": ["duration", "loan_yes"],
                "trees": [{"nodes": [
                    {"feature": 0, "threshold": 300.0, "left": 1, "right": 2},
                    {"value": [9, 1]},
                    {"value": [3, 7]}
                ]}]
            }
        })
    }

    #[test]
    fn test_load_valid_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), &tiny_artifact());

        let model = ModelLoader::new().load(&path).unwrap();
        assert_eq!(model.name, "tiny");
        assert_eq!(model.classes, vec!["no", "yes"]);
        assert_eq!(model.estimator.kind(), "random_forest");
        assert_eq!(model.preprocessor.step_names(), vec!["one_hot"]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelLoader::new()
            .load(dir.path().join("absent.json"))
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }

    #[test]
    fn test_corrupted_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"{\"format_version\": 1, \"name\": ").unwrap();

        let err = ModelLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Corrupt(_)));
    }

    #[test]
    fn test_unknown_preprocessing_component() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = tiny_artifact();
        body["preprocessor"]["steps"][0] = json!({"type": "target_encoder", "column": "job"});
        let path = write_artifact(dir.path(), &body);

        let err = ModelLoader::new().load(&path).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::UnresolvedComponent { ref name, .. } if name == "target_encoder"
        ));
    }

    #[test]
    fn test_unknown_estimator() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = tiny_artifact();
        body["estimator"]["type"] = json!("gradient_boosting");
        let path = write_artifact(dir.path(), &body);

        let err = ModelLoader::new().load(&path).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::UnresolvedComponent { kind: "estimator", .. }
        ));
    }

    #[test]
    fn test_threshold_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), &tiny_artifact());

        let config = ModelConfig {
            path: path.clone(),
            threshold: Some(0.3),
            onnx_threads: 1,
        };
        let model = ModelLoader::from_config(&config).load(&path).unwrap();
        assert_eq!(model.threshold, 0.3);
    }

    #[test]
    fn test_invalid_tree_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = tiny_artifact();
        body["estimator"]["trees"][0]["nodes"][0]["left"] = json!(7);
        let path = write_artifact(dir.path(), &body);

        let err = ModelLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Invalid(_)));
    }

    #[test]
    fn test_future_format_version() {
        let dir = tempfile::tempdir().unwrap();
        let body = json!({
            "format_version": 2,
            "labels": ["no", "yes"],
            "pipeline": [{"op": "bucketize", "column": "age"}],
            "estimator": {"type": "gbm", "rounds": 40}
        });
        let path = write_artifact(dir.path(), &body);

        let err = ModelLoader::new().load(&path).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::UnsupportedVersion {
                found: 2,
                expected: 1
            }
        ));
    }

    #[test]
    fn test_feature_dropped_by_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let body = json!({
            "format_version": 1,
            "name": "dropped",
            "version": "0.1.0",
            "classes": ["no", "yes"],
            "preprocessor": {"steps": [{"type": "drop", "columns": ["duration"]}]},
            "estimator": {
                "type": "logistic_regression",
                "features": ["duration"],
                "coefficients": [0.01],
                "intercept": -2.0
            }
        });
        let path = write_artifact(dir.path(), &body);

        let err = ModelLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Invalid(ref msg) if msg.contains("duration")));
    }

    #[test]
    fn test_categorical_feature_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = tiny_artifact();
        body["estimator"]["features"] = json!(["duration", "job"]);
        let path = write_artifact(dir.path(), &body);

        let err = ModelLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Invalid(ref msg) if msg.contains("job")));
    }
}
