//! Event Emitter - Detection state changes for the presentation layer
//!
//! Events go out on a broadcast channel; with no subscriber they are dropped.

use serde::Serialize;
use tokio::sync::broadcast;

use super::context::ModelState;
use super::prediction::{ErrorSeverity, Prediction};

/// Event names
pub mod names {
    pub const MODEL_READY: &str = "model:ready";
    pub const DETECTION_STARTED: &str = "detection:started";
    pub const DETECTION_STOPPED: &str = "detection:stopped";
    pub const PREDICTION_UPDATED: &str = "prediction:updated";
    pub const PREDICTION_CLEARED: &str = "prediction:cleared";
    pub const ERROR_RAISED: &str = "error:raised";
}

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DetectionEvent {
    ModelReady { state: ModelState },
    DetectionStarted,
    DetectionStopped,
    PredictionUpdated { prediction: Prediction },
    PredictionCleared,
    ErrorRaised { message: String, severity: ErrorSeverity },
}

impl DetectionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DetectionEvent::ModelReady { .. } => names::MODEL_READY,
            DetectionEvent::DetectionStarted => names::DETECTION_STARTED,
            DetectionEvent::DetectionStopped => names::DETECTION_STOPPED,
            DetectionEvent::PredictionUpdated { .. } => names::PREDICTION_UPDATED,
            DetectionEvent::PredictionCleared => names::PREDICTION_CLEARED,
            DetectionEvent::ErrorRaised { .. } => names::ERROR_RAISED,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<DetectionEvent>,
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl EventEmitter {
    pub fn subscribe(&self) -> broadcast::Receiver<DetectionEvent> {
        self.sender.subscribe()
    }

    /// Emit event to all listeners
    pub fn emit(&self, event: DetectionEvent) {
        log::trace!("emit {}", event.name());
        // Err only means nobody is listening
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers() {
        let emitter = EventEmitter::default();
        emitter.emit(DetectionEvent::DetectionStarted);
    }

    #[test]
    fn test_subscriber_receives() {
        let emitter = EventEmitter::default();
        let mut rx = emitter.subscribe();
        emitter.emit(DetectionEvent::PredictionCleared);
        assert_eq!(rx.try_recv().unwrap(), DetectionEvent::PredictionCleared);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(DetectionEvent::ModelReady {
            state: ModelState::ReadySimulated,
        })
        .unwrap();
        assert_eq!(json["event"], "model_ready");
        assert_eq!(json["state"], "ready_simulated");
    }
}
