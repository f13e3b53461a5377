//! Inference Backend
//!
//! Tagged union over the two backends. The detection loop matches on it,
//! so adding a variant forces every dispatch site to handle it.

use serde::{Deserialize, Serialize};

use super::buffer::FrameTensor;
use super::inference::{Classifier, InferenceError, ModelMetadata};
use super::simulated::SimulatedBackend;
use super::threshold::ThresholdConfig;

/// Accepted detection: label index and its confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label_index: usize,
    pub confidence: f32,
}

#[derive(Debug)]
pub enum InferenceBackend {
    Simulated(SimulatedBackend),
    Real(RealBackend),
}

impl InferenceBackend {
    pub fn engine_name(&self) -> &'static str {
        match self {
            InferenceBackend::Simulated(_) => "simulated",
            InferenceBackend::Real(_) => "onnx",
        }
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        match self {
            InferenceBackend::Simulated(_) => None,
            InferenceBackend::Real(real) => real.classifier.metadata(),
        }
    }
}

/// Real classifier plus the decoding rules for its output
pub struct RealBackend {
    classifier: Box<dyn Classifier>,
    label_count: usize,
    thresholds: ThresholdConfig,
}

impl std::fmt::Debug for RealBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealBackend")
            .field("metadata", &self.classifier.metadata())
            .field("label_count", &self.label_count)
            .field("thresholds", &self.thresholds)
            .finish()
    }
}

impl RealBackend {
    pub fn new(
        classifier: Box<dyn Classifier>,
        label_count: usize,
        thresholds: ThresholdConfig,
    ) -> Self {
        Self {
            classifier,
            label_count,
            thresholds,
        }
    }

    /// Forward pass and decode. `Ok(None)` is a normal "no detection" tick;
    /// `Err` means the backend itself is broken.
    pub fn infer(&mut self, tensor: FrameTensor) -> Result<Option<Detection>, InferenceError> {
        let (input, _lease) = tensor.into_parts();
        let probabilities = self.classifier.forward(input)?;
        Ok(decode(&probabilities, self.label_count, &self.thresholds))
    }
}

// ============================================================================
// DECODING
// ============================================================================

/// Index and value of the maximum; the first index wins on ties, NaN is skipped
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if v <= current => {}
            _ => best = Some((i, v)),
        }
    }
    best
}

/// Accept the argmax only above the threshold and inside the label range
pub fn decode(
    probabilities: &[f32],
    label_count: usize,
    thresholds: &ThresholdConfig,
) -> Option<Detection> {
    let (label_index, confidence) = argmax(probabilities)?;
    if !thresholds.accepts(confidence) || label_index >= label_count {
        return None;
    }
    Some(Detection {
        label_index,
        confidence: confidence.min(1.0),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::logic::model::buffer::BufferLedger;
    use ndarray::Array4;

    /// Returns fixed probabilities, or fails when `fail` is set
    pub(crate) struct StubClassifier {
        pub(crate) probabilities: Vec<f32>,
        pub(crate) fail: bool,
        pub(crate) calls: usize,
    }

    impl StubClassifier {
        pub(crate) fn returning(probabilities: Vec<f32>) -> Self {
            Self {
                probabilities,
                fail: false,
                calls: 0,
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                probabilities: Vec::new(),
                fail: true,
                calls: 0,
            }
        }
    }

    impl Classifier for StubClassifier {
        fn forward(&mut self, input: Array4<f32>) -> Result<Vec<f32>, InferenceError> {
            self.calls += 1;
            if self.fail {
                return Err(InferenceError::Runtime(format!(
                    "shape mismatch: got {:?}",
                    input.shape()
                )));
            }
            Ok(self.probabilities.clone())
        }
    }

    #[test]
    fn test_decode_picks_max() {
        let detection = decode(&[0.1, 0.6, 0.3], 3, &ThresholdConfig::default()).unwrap();
        assert_eq!(detection.label_index, 1);
        assert!((detection.confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_argmax_first_wins_on_tie() {
        assert_eq!(argmax(&[0.5, 0.5]), Some((0, 0.5)));
        assert_eq!(argmax(&[0.2, 0.7, 0.7]), Some((1, 0.7)));
    }

    #[test]
    fn test_decode_tie_above_threshold_takes_first() {
        let detection = decode(&[0.8, 0.8], 2, &ThresholdConfig::default()).unwrap();
        assert_eq!(detection.label_index, 0);
    }

    #[test]
    fn test_decode_below_threshold() {
        assert!(decode(&[0.4, 0.3, 0.3], 3, &ThresholdConfig::default()).is_none());
        // Exactly at the threshold is not enough
        assert!(decode(&[0.5, 0.5], 2, &ThresholdConfig::default()).is_none());
    }

    #[test]
    fn test_decode_out_of_range_index() {
        // Backend wider than the label set
        assert!(decode(&[0.1, 0.1, 0.8], 2, &ThresholdConfig::default()).is_none());
    }

    #[test]
    fn test_argmax_skips_nan_and_empty() {
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[f32::NAN, 0.3]), Some((1, 0.3)));
    }

    #[test]
    fn test_real_backend_releases_tensor() {
        let ledger = BufferLedger::new();
        let mut backend = RealBackend::new(
            Box::new(StubClassifier::returning(vec![0.1, 0.9])),
            2,
            ThresholdConfig::default(),
        );

        let tensor = FrameTensor::new(Array4::zeros((1, 4, 4, 3)), ledger.lease());
        let detection = backend.infer(tensor).unwrap().unwrap();
        assert_eq!(detection.label_index, 1);
        assert_eq!(ledger.live(), 0);

        let mut broken = RealBackend::new(
            Box::new(StubClassifier::failing()),
            2,
            ThresholdConfig::default(),
        );
        let tensor = FrameTensor::new(Array4::zeros((1, 4, 4, 3)), ledger.lease());
        assert!(broken.infer(tensor).is_err());
        assert_eq!(ledger.live(), 0);
    }
}
