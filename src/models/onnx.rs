//! ONNX classifier backed by ONNX Runtime

use crate::error::{ArtifactError, InferenceError};
use crate::models::estimator::Estimator;
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// ONNX Runtime session plus the names of its input and probability output
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    features: Vec<String>,
    n_classes: usize,
}

fn load_error(path: &Path, e: impl std::fmt::Display) -> ArtifactError {
    ArtifactError::Invalid(format!("onnx model {}: {}", path.display(), e))
}

impl OnnxClassifier {
    pub fn load<P: AsRef<Path>>(
        path: P,
        features: Vec<String>,
        n_classes: usize,
        threads: usize,
    ) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "onnx model not found"),
            });
        }

        info!(path = %path.display(), threads = threads, "Loading ONNX estimator");

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(threads))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| load_error(path, e))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| load_error(path, "model declares no inputs"))?;

        // skl2onnx classifiers emit `label` then `probabilities`
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .ok_or_else(|| load_error(path, "model declares no outputs"))?;

        info!(input = %input_name, output = %output_name, "ONNX estimator loaded");

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            features,
            n_classes,
        })
    }

    fn from_tensor(&self, shape: &[i64], data: &[f32]) -> Result<Vec<f64>, InferenceError> {
        let width = shape.last().copied().unwrap_or(0) as usize;
        if width != self.n_classes || data.len() < self.n_classes {
            return Err(InferenceError::OutputShape {
                found: width,
                expected: self.n_classes,
            });
        }
        Ok(data[..self.n_classes].iter().map(|&p| p as f64).collect())
    }

    /// seq(map(int64, float)) as emitted by ZipMap
    fn from_sequence_map(&self, output: &DynValue) -> Result<Vec<f64>, InferenceError> {
        let backend = |e: ort::Error| InferenceError::Backend(e.to_string());
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(backend)?;
        let maps = sequence
            .try_extract_sequence::<DynMapValueType>(&allocator)
            .map_err(backend)?;
        let first = maps
            .first()
            .ok_or_else(|| InferenceError::Backend("empty probability sequence".into()))?;

        let mut probs = vec![0.0; self.n_classes];
        for (class_id, prob) in first.try_extract_key_values::<i64, f32>().map_err(backend)? {
            let idx = class_id as usize;
            if idx >= self.n_classes {
                return Err(InferenceError::OutputShape {
                    found: idx + 1,
                    expected: self.n_classes,
                });
            }
            probs[idx] = prob as f64;
        }
        Ok(probs)
    }

    fn extract(&self, outputs: &SessionOutputs) -> Result<Vec<f64>, InferenceError> {
        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            InferenceError::Backend(format!("output `{}` missing", self.output_name))
        })?;

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return self.from_tensor(&dims, data);
        }
        if DynSequenceValueType::can_downcast(output.dtype()) {
            return self.from_sequence_map(output);
        }
        Err(InferenceError::Backend(format!(
            "unsupported output type for `{}`",
            self.output_name
        )))
    }
}

impl Estimator for OnnxClassifier {
    fn kind(&self) -> &'static str {
        "onnx"
    }

    fn features(&self) -> &[String] {
        &self.features
    }

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, InferenceError> {
        let backend = |e: ort::Error| InferenceError::Backend(e.to_string());

        let shape = vec![1_i64, features.len() as i64];
        let input = Tensor::from_array((shape, features.to_vec())).map_err(backend)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| InferenceError::Backend(format!("session lock poisoned: {}", e)))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(backend)?;

        let probs = self.extract(&outputs)?;
        debug!(probs = ?probs, "ONNX inference complete");
        Ok(probs)
    }
}
