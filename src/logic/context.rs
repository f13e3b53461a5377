//! Detection Context
//!
//! Explicit state shared by the model loader, the detection loop and the
//! presentation layer. Built once at startup and kept for the process
//! lifetime.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, Notify};

use super::events::{DetectionEvent, EventEmitter};
use super::labels::LabelSet;
use super::model::backend::{Detection, InferenceBackend};
use super::model::inference::ModelMetadata;
use super::prediction::{ErrorReporter, ErrorSeverity, Prediction, PredictionStore};

/// Leaves `Loading` exactly once and never goes back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    Loading,
    ReadyReal,
    ReadySimulated,
}

impl ModelState {
    fn of(backend: &InferenceBackend) -> Self {
        match backend {
            InferenceBackend::Real(_) => ModelState::ReadyReal,
            InferenceBackend::Simulated(_) => ModelState::ReadySimulated,
        }
    }

    pub fn is_ready(&self) -> bool {
        !matches!(self, ModelState::Loading)
    }
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("a backend is already installed ({0:?})")]
    BackendAlreadyInstalled(ModelState),
}

/// Read-only projection for the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct DetectionSnapshot {
    pub model_state: ModelState,
    pub detecting: bool,
    pub prediction: Option<Prediction>,
    pub error: Option<ErrorView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorView {
    pub message: String,
    pub severity: ErrorSeverity,
}

#[derive(Debug, Default)]
struct InferenceStats {
    count: AtomicU64,
    latency_sum_us: AtomicU64,
}

pub struct DetectionContext {
    labels: LabelSet,
    backend: Mutex<Option<InferenceBackend>>,
    model_state: RwLock<ModelState>,
    metadata: RwLock<Option<ModelMetadata>>,
    running: AtomicBool,
    wake: Notify,
    predictions: Mutex<PredictionStore>,
    errors: Mutex<ErrorReporter>,
    stats: InferenceStats,
    events: EventEmitter,
}

impl DetectionContext {
    pub fn new(labels: LabelSet, error_ttl: Duration) -> Self {
        Self {
            labels,
            backend: Mutex::new(None),
            model_state: RwLock::new(ModelState::Loading),
            metadata: RwLock::new(None),
            running: AtomicBool::new(false),
            wake: Notify::new(),
            predictions: Mutex::new(PredictionStore::default()),
            errors: Mutex::new(ErrorReporter::new(error_ttl)),
            stats: InferenceStats::default(),
            events: EventEmitter::default(),
        }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    // ========================================================================
    // MODEL
    // ========================================================================

    pub fn model_state(&self) -> ModelState {
        *self.model_state.read()
    }

    pub fn model_metadata(&self) -> Option<ModelMetadata> {
        self.metadata.read().clone()
    }

    /// Install the one and only backend; the model state follows its variant
    pub fn install_backend(&self, backend: InferenceBackend) -> Result<ModelState, ContextError> {
        let mut slot = self.backend.lock();
        if let Some(existing) = slot.as_ref() {
            return Err(ContextError::BackendAlreadyInstalled(ModelState::of(existing)));
        }

        let state = ModelState::of(&backend);
        *self.metadata.write() = backend.metadata().cloned();
        *slot = Some(backend);
        *self.model_state.write() = state;
        drop(slot);

        log::info!("Model ready: {:?}", state);
        self.events.emit(DetectionEvent::ModelReady { state });
        Ok(state)
    }

    /// Run `f` against the backend; `None` while still loading
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut InferenceBackend) -> R) -> Option<R> {
        let mut slot = self.backend.lock();
        slot.as_mut().map(f)
    }

    // ========================================================================
    // DETECTION FLAG
    // ========================================================================

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Idle -> Running. Always clears the prediction, even when already running.
    pub fn start(&self) {
        let was_running = self.running.swap(true, Ordering::AcqRel);
        self.clear_prediction();
        self.errors.lock().clear_fatal();

        if !was_running {
            log::info!("Detection started");
            self.events.emit(DetectionEvent::DetectionStarted);
            self.wake.notify_one();
        }
    }

    /// Running -> Idle, clears the prediction
    pub fn stop(&self) {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        self.clear_prediction();

        if was_running {
            log::info!("Detection stopped");
            self.events.emit(DetectionEvent::DetectionStopped);
        }
    }

    /// Returns the new flag value
    pub fn toggle(&self) -> bool {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
        self.is_running()
    }

    /// Forced stop after a backend failure; the error stays visible
    pub fn fail_session(&self, message: impl Into<String>) {
        let message = message.into();
        log::error!("Detection halted: {}", message);
        self.stop();
        self.raise_error(message, ErrorSeverity::Fatal);
    }

    /// Resolves once the flag is Running
    pub async fn wait_for_start(&self) {
        while !self.is_running() {
            self.wake.notified().await;
        }
    }

    // ========================================================================
    // PREDICTION / ERRORS
    // ========================================================================

    /// Store an accepted detection; `None` while Idle or if its index has
    /// no label. The flag is read under the store lock, so a detection that
    /// finishes after `stop()` is dropped.
    pub fn record_detection(&self, detection: Detection) -> Option<Prediction> {
        let label = self.labels.get(detection.label_index)?;
        let mut store = self.predictions.lock();
        if !self.is_running() {
            return None;
        }
        let prediction = store.record(label, detection.label_index, detection.confidence);
        self.events.emit(DetectionEvent::PredictionUpdated {
            prediction: prediction.clone(),
        });
        Some(prediction)
    }

    pub fn clear_prediction(&self) {
        let mut store = self.predictions.lock();
        if store.clear() {
            self.events.emit(DetectionEvent::PredictionCleared);
        }
    }

    pub fn prediction(&self) -> Option<Prediction> {
        self.predictions.lock().current().cloned()
    }

    pub fn raise_error(&self, message: impl Into<String>, severity: ErrorSeverity) {
        let message = message.into();
        self.errors.lock().raise(message.clone(), severity);
        self.events.emit(DetectionEvent::ErrorRaised { message, severity });
    }

    pub fn error(&self) -> Option<ErrorView> {
        self.errors.lock().current().map(|n| ErrorView {
            message: n.message.clone(),
            severity: n.severity,
        })
    }

    pub fn error_message(&self) -> Option<String> {
        self.errors.lock().message()
    }

    // ========================================================================
    // STATS / VIEWS
    // ========================================================================

    pub fn record_inference(&self, elapsed: Duration) {
        self.stats.count.fetch_add(1, Ordering::Relaxed);
        self.stats
            .latency_sum_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn inference_count(&self) -> u64 {
        self.stats.count.load(Ordering::Relaxed)
    }

    pub fn avg_latency_ms(&self) -> f32 {
        let count = self.inference_count();
        if count == 0 {
            return 0.0;
        }
        let sum = self.stats.latency_sum_us.load(Ordering::Relaxed);
        (sum as f32 / count as f32) / 1000.0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DetectionEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> DetectionSnapshot {
        DetectionSnapshot {
            model_state: self.model_state(),
            detecting: self.is_running(),
            prediction: self.prediction(),
            error: self.error(),
        }
    }
}
