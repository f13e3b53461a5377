use serde::{Deserialize, Serialize};

use crate::logic::context::ModelState;
use crate::logic::model::ModelMetadata;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub model: ModelStatus,
    pub labels: Vec<String>,
    pub detecting: bool,
    pub inference_count: u64,
    pub avg_latency_ms: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub engine: String, // "loading" | "onnx" | "simulated"
    pub state: ModelState,
    pub loaded: bool,
    pub metadata: Option<ModelMetadata>,
}
