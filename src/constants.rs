//! Central Configuration Constants
//!
//! Single source of truth for all detection defaults.
//! Every value can be overridden through a `SIGNSIGHT_*` environment variable.

use std::path::PathBuf;

/// Well-known location of the gesture classifier
pub const DEFAULT_MODEL_PATH: &str = "models/sign_classifier.onnx";

/// Settle delay before the model loader starts (milliseconds)
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;

/// Display refresh cadence the detection loop ticks at
pub const DEFAULT_REFRESH_HZ: u32 = 60;

/// Spatial input size of the classifier (square)
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// Minimum probability for a real backend detection
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Per-tick detection probability of the simulated backend
pub const DEFAULT_SIMULATED_RATE: f32 = 0.05;

/// Confidence range emitted by the simulated backend
pub const SIMULATED_CONFIDENCE_MIN: f32 = 0.85;
pub const SIMULATED_CONFIDENCE_MAX: f32 = 0.99;

/// Lifetime of an advisory error message (seconds)
pub const ERROR_TTL_SECS: u64 = 5;

/// Default camera device index
pub const DEFAULT_CAMERA_INDEX: u32 = 0;

/// Default ONNX Runtime intra-op threads
pub const DEFAULT_INTRA_THREADS: usize = 2;

/// Reference label set, in classifier output order
pub const DEFAULT_LABELS: [&str; 15] = [
    "Hello",
    "Thank You",
    "Yes",
    "No",
    "Please",
    "Sorry",
    "I Love You",
    "Help",
    "Stop",
    "More",
    "Eat",
    "Drink",
    "Friend",
    "Family",
    "Good",
];

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "SignSight";

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Get model path from environment or use default
pub fn get_model_path() -> PathBuf {
    std::env::var("SIGNSIGHT_MODEL_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH))
}

/// Optional JSON label file replacing the built-in labels
pub fn get_labels_file() -> Option<PathBuf> {
    std::env::var("SIGNSIGHT_LABELS_FILE").ok().map(PathBuf::from)
}

/// Optional still image / image directory to replay instead of a camera
pub fn get_frames_path() -> Option<PathBuf> {
    std::env::var("SIGNSIGHT_FRAMES_PATH").ok().map(PathBuf::from)
}

pub fn get_settle_delay_ms() -> u64 {
    env_parsed("SIGNSIGHT_SETTLE_DELAY_MS").unwrap_or(DEFAULT_SETTLE_DELAY_MS)
}

pub fn get_refresh_hz() -> u32 {
    env_parsed::<u32>("SIGNSIGHT_REFRESH_HZ")
        .filter(|hz| *hz > 0)
        .unwrap_or(DEFAULT_REFRESH_HZ)
}

pub fn get_input_size() -> u32 {
    env_parsed::<u32>("SIGNSIGHT_INPUT_SIZE")
        .filter(|size| *size > 0)
        .unwrap_or(DEFAULT_INPUT_SIZE)
}

pub fn get_camera_index() -> u32 {
    env_parsed("SIGNSIGHT_CAMERA_INDEX").unwrap_or(DEFAULT_CAMERA_INDEX)
}

pub fn get_intra_threads() -> usize {
    env_parsed::<usize>("SIGNSIGHT_INTRA_THREADS")
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_INTRA_THREADS)
}

/// Probability-like settings must lie in [0, 1]
pub fn get_unit_value(key: &str, default: f32) -> f32 {
    match env_parsed::<f32>(key) {
        Some(v) if (0.0..=1.0).contains(&v) => v,
        Some(v) => {
            log::warn!("{} = {} is outside [0, 1], using {}", key, v, default);
            default
        }
        None => default,
    }
}

/// Start detecting as soon as the runner is up (opt-in, Idle otherwise)
pub fn is_auto_start() -> bool {
    std::env::var("SIGNSIGHT_AUTO_START")
        .map(|s| parse_flag(&s))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" 1 "));
        assert!(parse_flag("YES"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}
