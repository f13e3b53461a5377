//! Inference Engine - ONNX Runtime Integration
//!
//! Loads the gesture classifier and runs its forward pass.
//! Kept behind the [`Classifier`] trait so the real backend can be swapped.

use std::path::Path;

use ndarray::Array4;
use once_cell::sync::OnceCell;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Diagnostics recorded when a real model is loaded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub input_name: String,
    pub input_type: String,
    pub output_name: String,
    pub output_type: String,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Acquisition failures; always recovered by the loader
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model not found: {0}")]
    NotFound(String),
    #[error("execution engine unavailable: {0}")]
    Engine(String),
    #[error("failed to load model: {0}")]
    Session(String),
    #[error("model declares no {0}")]
    MissingBinding(&'static str),
    #[error("loader task failed: {0}")]
    Join(String),
}

/// Forward pass failures; fatal to the running detection session
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("input tensor error: {0}")]
    Input(String),
    #[error("inference failed: {0}")]
    Runtime(String),
    #[error("output `{0}` missing")]
    MissingOutput(String),
    #[error("output extract error: {0}")]
    Extract(String),
    #[error("preprocessing failed: {0}")]
    Preprocess(#[from] crate::logic::frame::PreprocessError),
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Produces one probability per label from a `[1, H, W, 3]` input
pub trait Classifier: Send {
    fn forward(&mut self, input: Array4<f32>) -> Result<Vec<f32>, InferenceError>;

    fn metadata(&self) -> Option<&ModelMetadata> {
        None
    }
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

pub struct OnnxClassifier {
    session: Session,
    output_name: String,
    metadata: ModelMetadata,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Process-wide ONNX Runtime environment, committed once
static ENGINE: OnceCell<Result<(), String>> = OnceCell::new();

/// Configure the ONNX Runtime environment before the first session
fn init_engine() -> Result<(), ModelLoadError> {
    ENGINE
        .get_or_init(|| {
            let result = ort::init()
                .with_name("signsight")
                .commit()
                .map(|_| ())
                .map_err(|e| e.to_string());
            match &result {
                Ok(()) => log::info!("ONNX Runtime environment ready"),
                Err(e) => log::warn!("ONNX Runtime environment failed: {}", e),
            }
            result
        })
        .clone()
        .map_err(ModelLoadError::Engine)
}

impl OnnxClassifier {
    /// Load ONNX model from file
    pub fn load(model_path: &Path, intra_threads: usize) -> Result<Self, ModelLoadError> {
        log::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(ModelLoadError::NotFound(model_path.display().to_string()));
        }

        init_engine()?;

        let session = Session::builder()
            .map_err(|e| ModelLoadError::Engine(format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelLoadError::Session(format!("optimization: {}", e)))?
            .with_intra_threads(intra_threads)
            .map_err(|e| ModelLoadError::Session(format!("threads: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| ModelLoadError::Session(e.to_string()))?;

        let input = session.inputs.first().ok_or(ModelLoadError::MissingBinding("input"))?;
        let output = session.outputs.first().ok_or(ModelLoadError::MissingBinding("output"))?;

        let metadata = ModelMetadata {
            model_path: model_path.display().to_string(),
            input_name: input.name.clone(),
            input_type: format!("{:?}", input.input_type),
            output_name: output.name.clone(),
            output_type: format!("{:?}", output.output_type),
            loaded_at: chrono::Utc::now(),
        };
        let output_name = output.name.clone();

        Ok(Self {
            session,
            output_name,
            metadata,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn forward(&mut self, input: Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        let input_tensor =
            Tensor::from_array(input).map_err(|e| InferenceError::Input(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError::Runtime(e.to_string()))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| InferenceError::MissingOutput(self.output_name.clone()))?;

        let (_shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Extract(e.to_string()))?;

        Ok(data.to_vec())
    }

    fn metadata(&self) -> Option<&ModelMetadata> {
        Some(&self.metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_model() {
        let err = OnnxClassifier::load(Path::new("definitely/not/here.onnx"), 1).unwrap_err();
        assert!(matches!(err, ModelLoadError::NotFound(_)));
    }

    #[test]
    fn test_engine_init_is_cached() {
        let first = init_engine().map_err(|e| e.to_string());
        let second = init_engine().map_err(|e| e.to_string());
        assert_eq!(first, second);
        assert!(ENGINE.get().is_some());
    }

    #[test]
    fn test_malformed_model() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"this is not an onnx graph").unwrap();

        assert!(OnnxClassifier::load(file.path(), 1).is_err());
    }
}
