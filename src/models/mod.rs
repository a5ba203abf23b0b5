//! Model artifact loading and inference components

pub mod artifact;
pub mod estimator;
pub mod forest;
pub mod frame;
pub mod inference;
pub mod linear;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod preprocess;

pub use estimator::Estimator;
pub use inference::InferenceEngine;
pub use loader::ModelLoader;
