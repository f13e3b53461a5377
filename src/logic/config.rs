//! Detector Configuration
//!
//! Gathered once at startup from the environment (and `.env`).

use std::path::PathBuf;
use std::time::Duration;

use crate::constants;
use super::model::threshold::ThresholdConfig;

/// Runtime configuration for the detection pipeline
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Classifier location
    pub model_path: PathBuf,

    /// Optional JSON label list
    pub labels_file: Option<PathBuf>,

    /// Delay before model acquisition starts
    pub settle_delay: Duration,

    /// Display refresh cadence (ticks per second)
    pub refresh_hz: u32,

    /// Square input size of the classifier
    pub input_size: u32,

    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,

    /// Detection thresholds
    pub thresholds: ThresholdConfig,

    /// Lifetime of advisory error messages
    pub error_ttl: Duration,

    /// Replay source instead of a camera
    pub frames_path: Option<PathBuf>,

    /// Camera device index
    pub camera_index: u32,

    /// Start detecting without waiting for a toggle (off by default)
    pub auto_start: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(constants::DEFAULT_MODEL_PATH),
            labels_file: None,
            settle_delay: Duration::from_millis(constants::DEFAULT_SETTLE_DELAY_MS),
            refresh_hz: constants::DEFAULT_REFRESH_HZ,
            input_size: constants::DEFAULT_INPUT_SIZE,
            intra_threads: constants::DEFAULT_INTRA_THREADS,
            thresholds: ThresholdConfig::default(),
            error_ttl: Duration::from_secs(constants::ERROR_TTL_SECS),
            frames_path: None,
            camera_index: constants::DEFAULT_CAMERA_INDEX,
            auto_start: false,
        }
    }
}

impl DetectorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            model_path: constants::get_model_path(),
            labels_file: constants::get_labels_file(),
            settle_delay: Duration::from_millis(constants::get_settle_delay_ms()),
            refresh_hz: constants::get_refresh_hz(),
            input_size: constants::get_input_size(),
            intra_threads: constants::get_intra_threads(),
            thresholds: ThresholdConfig::from_env(),
            error_ttl: Duration::from_secs(constants::ERROR_TTL_SECS),
            frames_path: constants::get_frames_path(),
            camera_index: constants::get_camera_index(),
            auto_start: constants::is_auto_start(),
        }
    }

    /// Interval between two display refresh opportunities
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.refresh_hz.max(1) as u64)
    }
}
