//! Model Module - Gesture inference backends
//!
//! - `loader` - one-shot model acquisition with simulated fallback
//! - `backend` - Simulated/Real tagged union and output decoding
//! - `inference` - ONNX Runtime classifier
//! - `simulated` - random backend used without a model
//! - `threshold` - acceptance and simulation constants
//! - `buffer` - tick-scoped tensor accounting

pub mod backend;
pub mod buffer;
pub mod inference;
pub mod loader;
pub mod simulated;
pub mod threshold;

// Re-export common types
pub use backend::{Detection, InferenceBackend, RealBackend};
pub use inference::{Classifier, InferenceError, ModelMetadata};
pub use loader::ModelLoader;
pub use threshold::ThresholdConfig;
