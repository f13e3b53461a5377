//! Detection Loop
//!
//! Cooperative scheduler driving FrameSource -> Preprocessor -> Backend.
//! One long-lived task: parked on the context while Idle, one tick per
//! display refresh while Running. Ticks never overlap; the flag is checked
//! around every tick and again inside it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::context::DetectionContext;
use super::frame::{FramePreprocessor, FrameSource};
use super::model::backend::{Detection, InferenceBackend};
use super::model::inference::InferenceError;
use super::prediction::Prediction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Idle,
    ModelLoading,
    FrameUnavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Skipped(SkipReason),
    NoDetection,
    Detected(Prediction),
    /// The backend failed; detection has been forced off
    Failed(String),
}

pub struct DetectionLoop {
    ctx: Arc<DetectionContext>,
    frames: Box<dyn FrameSource>,
    preprocessor: FramePreprocessor,
    refresh: Duration,
}

impl DetectionLoop {
    pub fn new(
        ctx: Arc<DetectionContext>,
        frames: Box<dyn FrameSource>,
        preprocessor: FramePreprocessor,
        refresh: Duration,
    ) -> Self {
        Self {
            ctx,
            frames,
            preprocessor,
            refresh,
        }
    }

    pub fn preprocessor(&self) -> &FramePreprocessor {
        &self.preprocessor
    }

    /// Spawn onto the current tokio runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        log::info!(
            "Detection loop ready ({}, every {:?})",
            self.frames.describe(),
            self.refresh
        );

        let ctx = Arc::clone(&self.ctx);
        let refresh = self.refresh;
        let mut this = self;

        loop {
            ctx.wait_for_start().await;

            let mut ticker = tokio::time::interval(refresh);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if !ctx.is_running() {
                    break;
                }

                // Forward passes block; the tick runs on the blocking pool and
                // the next one is not scheduled until it returns.
                let ticked = tokio::task::spawn_blocking(move || {
                    let mut this = this;
                    this.tick();
                    this
                })
                .await;
                this = match ticked {
                    Ok(this) => this,
                    Err(e) => {
                        ctx.fail_session(format!("Gesture detection stopped: {}", e));
                        return;
                    }
                };

                if !ctx.is_running() {
                    break;
                }
            }

            log::debug!("Detection loop parked");
        }
    }

    /// One unit of work. Per-tick noise is absorbed here; only a backend
    /// failure changes the running state.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.ctx.is_running() {
            return TickOutcome::Skipped(SkipReason::Idle);
        }
        if !self.ctx.model_state().is_ready() {
            log::trace!("tick skipped: model loading");
            return TickOutcome::Skipped(SkipReason::ModelLoading);
        }
        let Some(frame) = self.frames.current_frame() else {
            log::trace!("tick skipped: frame unavailable");
            return TickOutcome::Skipped(SkipReason::FrameUnavailable);
        };

        let started = Instant::now();
        let preprocessor = &self.preprocessor;
        let result = self.ctx.with_backend(
            |backend| -> Result<Option<Detection>, InferenceError> {
                match backend {
                    InferenceBackend::Simulated(simulated) => Ok(simulated.infer()),
                    InferenceBackend::Real(real) => {
                        let tensor = preprocessor.preprocess(&frame)?;
                        real.infer(tensor)
                    }
                }
            },
        );
        let Some(result) = result else {
            return TickOutcome::Skipped(SkipReason::ModelLoading);
        };
        self.ctx.record_inference(started.elapsed());

        match result {
            Ok(Some(detection)) => {
                // None as well when stopped while the inference was in flight
                match self.ctx.record_detection(detection) {
                    Some(prediction) => {
                        log::debug!(
                            "frame {}: {} ({:.2})",
                            frame.id,
                            prediction.label,
                            prediction.confidence
                        );
                        TickOutcome::Detected(prediction)
                    }
                    None => TickOutcome::NoDetection,
                }
            }
            Ok(None) => TickOutcome::NoDetection,
            Err(e) => {
                let message = format!("Gesture detection stopped: {}", e);
                self.ctx.fail_session(message.clone());
                TickOutcome::Failed(message)
            }
        }
    }
}
