//! Commands for the presentation layer
//!
//! The presentation layer only reads snapshots and issues start/stop
//! (usually through the single toggle).

use super::engine_status::{EngineStatus, ModelStatus};
use crate::logic::context::{DetectionContext, DetectionSnapshot, ModelState};

/// Start or stop detection; returns the new detecting flag
pub fn toggle_detection(ctx: &DetectionContext) -> bool {
    ctx.toggle()
}

pub fn start_detection(ctx: &DetectionContext) -> bool {
    ctx.start();
    ctx.is_running()
}

pub fn stop_detection(ctx: &DetectionContext) -> bool {
    ctx.stop();
    ctx.is_running()
}

/// Current prediction, error and flags
pub fn get_detection_state(ctx: &DetectionContext) -> DetectionSnapshot {
    ctx.snapshot()
}

pub fn get_detection_state_json(ctx: &DetectionContext) -> Result<String, String> {
    serde_json::to_string(&ctx.snapshot()).map_err(|e| e.to_string())
}

pub fn get_engine_status(ctx: &DetectionContext) -> EngineStatus {
    let state = ctx.model_state();
    let engine = match state {
        ModelState::Loading => "loading",
        ModelState::ReadyReal => "onnx",
        ModelState::ReadySimulated => "simulated",
    };

    EngineStatus {
        model: ModelStatus {
            engine: engine.to_string(),
            state,
            loaded: state == ModelState::ReadyReal,
            metadata: ctx.model_metadata(),
        },
        labels: ctx.labels().iter().map(str::to_string).collect(),
        detecting: ctx.is_running(),
        inference_count: ctx.inference_count(),
        avg_latency_ms: ctx.avg_latency_ms(),
    }
}

pub fn get_engine_status_json(ctx: &DetectionContext) -> Result<String, String> {
    serde_json::to_string_pretty(&get_engine_status(ctx)).map_err(|e| e.to_string())
}
