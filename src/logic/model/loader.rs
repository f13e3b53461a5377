//! Model Loader
//!
//! Acquires the backend once at startup. A real ONNX classifier when the
//! model resource loads, the simulated backend otherwise. Failures never
//! reach the caller; they become a self-clearing advisory.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::backend::{InferenceBackend, RealBackend};
use super::inference::{Classifier, ModelLoadError, OnnxClassifier};
use super::simulated::SimulatedBackend;
use super::threshold::ThresholdConfig;
use crate::logic::config::DetectorConfig;
use crate::logic::context::{DetectionContext, ModelState};
use crate::logic::prediction::ErrorSeverity;

pub const SIMULATED_ADVISORY: &str = "Gesture model unavailable - running in simulated mode";

#[derive(Debug, Clone)]
pub struct ModelLoader {
    model_path: PathBuf,
    intra_threads: usize,
    settle_delay: Duration,
    thresholds: ThresholdConfig,
}

impl ModelLoader {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            model_path: config.model_path.clone(),
            intra_threads: config.intra_threads,
            settle_delay: config.settle_delay,
            thresholds: config.thresholds,
        }
    }

    /// Wait for the settle delay, acquire a backend and install it.
    /// Returns the resulting model state; never `Loading`.
    pub async fn load(&self, ctx: Arc<DetectionContext>) -> ModelState {
        tokio::time::sleep(self.settle_delay).await;

        let label_count = ctx.labels().len();
        let backend = match self.acquire().await {
            Ok(classifier) => {
                if let Some(meta) = classifier.metadata() {
                    log::info!(
                        "ONNX model loaded: input `{}` {} -> output `{}` {}",
                        meta.input_name,
                        meta.input_type,
                        meta.output_name,
                        meta.output_type
                    );
                }
                InferenceBackend::Real(RealBackend::new(
                    Box::new(classifier),
                    label_count,
                    self.thresholds,
                ))
            }
            Err(e) => {
                log::warn!("Model acquisition failed ({}) - using simulated backend", e);
                ctx.raise_error(SIMULATED_ADVISORY, ErrorSeverity::Advisory);
                InferenceBackend::Simulated(SimulatedBackend::new(label_count, self.thresholds))
            }
        };

        match ctx.install_backend(backend) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("Model loader called twice: {}", e);
                ctx.model_state()
            }
        }
    }

    async fn acquire(&self) -> Result<OnnxClassifier, ModelLoadError> {
        let path = self.model_path.clone();
        let threads = self.intra_threads;
        tokio::task::spawn_blocking(move || OnnxClassifier::load(&path, threads))
            .await
            .map_err(|e| ModelLoadError::Join(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::labels::LabelSet;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn loader_for(path: PathBuf) -> ModelLoader {
        ModelLoader::new(&DetectorConfig {
            model_path: path,
            settle_delay: Duration::from_millis(10),
            intra_threads: 1,
            ..Default::default()
        })
    }

    fn context() -> Arc<DetectionContext> {
        Arc::new(DetectionContext::new(LabelSet::default(), Duration::from_secs(5)))
    }

    #[tokio::test]
    async fn test_missing_model_falls_back() {
        let ctx = context();
        let loader = loader_for(PathBuf::from("no/such/model.onnx"));

        let state = loader.load(ctx.clone()).await;
        assert_eq!(state, ModelState::ReadySimulated);
        assert_eq!(ctx.model_state(), ModelState::ReadySimulated);
        assert_eq!(ctx.error_message().as_deref(), Some(SIMULATED_ADVISORY));
        assert!(ctx.model_metadata().is_none());
    }

    #[tokio::test]
    async fn test_malformed_model_falls_back() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\x00\x01garbage").unwrap();

        let ctx = context();
        let state = loader_for(file.path().to_path_buf()).load(ctx.clone()).await;
        assert_eq!(state, ModelState::ReadySimulated);
        assert_eq!(ctx.with_backend(|b| b.engine_name()), Some("simulated"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_advisory_clears_after_five_seconds() {
        let ctx = context();
        loader_for(PathBuf::from("no/such/model.onnx"))
            .load(ctx.clone())
            .await;
        assert!(ctx.error_message().is_some());

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(ctx.error_message().is_none());
    }

    #[tokio::test]
    async fn test_state_is_loading_until_settled() {
        let ctx = context();
        let loader = ModelLoader::new(&DetectorConfig {
            model_path: PathBuf::from("no/such/model.onnx"),
            settle_delay: Duration::from_millis(200),
            ..Default::default()
        });

        let task = tokio::spawn({
            let ctx = ctx.clone();
            async move { loader.load(ctx).await }
        });
        assert_eq!(ctx.model_state(), ModelState::Loading);
        assert_eq!(task.await.unwrap(), ModelState::ReadySimulated);
    }
}
