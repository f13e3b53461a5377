//! Detection Threshold Configuration
//!
//! Acceptance threshold for the real backend and the knobs of the
//! simulated backend.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Threshold Configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// A real detection needs a maximum probability strictly above this
    pub confidence_threshold: f32,

    /// Probability that the simulated backend emits a detection on a tick
    pub simulated_rate: f32,

    /// Confidence range of simulated detections (inclusive)
    pub simulated_confidence_min: f32,
    pub simulated_confidence_max: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: constants::DEFAULT_CONFIDENCE_THRESHOLD,
            simulated_rate: constants::DEFAULT_SIMULATED_RATE,
            simulated_confidence_min: constants::SIMULATED_CONFIDENCE_MIN,
            simulated_confidence_max: constants::SIMULATED_CONFIDENCE_MAX,
        }
    }
}

impl ThresholdConfig {
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
            ..Default::default()
        }
    }

    /// Read overrides from `SIGNSIGHT_CONFIDENCE_THRESHOLD` / `SIGNSIGHT_SIMULATED_RATE`
    pub fn from_env() -> Self {
        Self {
            confidence_threshold: constants::get_unit_value(
                "SIGNSIGHT_CONFIDENCE_THRESHOLD",
                constants::DEFAULT_CONFIDENCE_THRESHOLD,
            ),
            simulated_rate: constants::get_unit_value(
                "SIGNSIGHT_SIMULATED_RATE",
                constants::DEFAULT_SIMULATED_RATE,
            ),
            ..Default::default()
        }
    }

    /// Check if a probability is high enough to count as a detection
    pub fn accepts(&self, probability: f32) -> bool {
        probability > self.confidence_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_config() {
        let config = ThresholdConfig::default();
        assert_eq!(config.confidence_threshold, 0.5);
        assert_eq!(config.simulated_rate, 0.05);
        assert_eq!(config.simulated_confidence_min, 0.85);
        assert_eq!(config.simulated_confidence_max, 0.99);
    }

    #[test]
    fn test_threshold_is_strict() {
        let config = ThresholdConfig::new(0.5);
        assert!(!config.accepts(0.5));
        assert!(config.accepts(0.5001));
        assert!(!config.accepts(0.4));
    }
}
