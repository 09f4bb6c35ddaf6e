pub mod artifact_cache;
pub mod naive_predictor;
#[cfg(feature = "onnx")]
pub mod onnx_predictor;
pub mod registry;
pub mod smartcore_predictor;

pub use registry::ModelRegistry;
