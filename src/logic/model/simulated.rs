//! Simulated Backend
//!
//! Stands in when no real model could be acquired. Ignores frames entirely:
//! on each tick it emits a random label with probability `simulated_rate`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::backend::Detection;
use super::threshold::ThresholdConfig;

/// Source of random draws, injectable for tests
pub trait Entropy: Send {
    /// Uniform in [0, 1)
    fn unit(&mut self) -> f32;

    /// Uniform in [0, n)
    fn index(&mut self, n: usize) -> usize;

    /// Uniform in [low, high]
    fn between(&mut self, low: f32, high: f32) -> f32;
}

impl Entropy for StdRng {
    fn unit(&mut self) -> f32 {
        self.gen::<f32>()
    }

    fn index(&mut self, n: usize) -> usize {
        self.gen_range(0..n)
    }

    fn between(&mut self, low: f32, high: f32) -> f32 {
        self.gen_range(low..=high)
    }
}

pub struct SimulatedBackend {
    entropy: Box<dyn Entropy>,
    label_count: usize,
    thresholds: ThresholdConfig,
}

impl std::fmt::Debug for SimulatedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedBackend")
            .field("label_count", &self.label_count)
            .field("thresholds", &self.thresholds)
            .finish()
    }
}

impl SimulatedBackend {
    pub fn new(label_count: usize, thresholds: ThresholdConfig) -> Self {
        Self::with_entropy(label_count, thresholds, Box::new(StdRng::from_entropy()))
    }

    pub fn with_entropy(
        label_count: usize,
        thresholds: ThresholdConfig,
        entropy: Box<dyn Entropy>,
    ) -> Self {
        Self {
            entropy,
            label_count,
            thresholds,
        }
    }

    /// One tick: `Some` with probability `simulated_rate`
    pub fn infer(&mut self) -> Option<Detection> {
        if self.label_count == 0 {
            return None;
        }
        if self.entropy.unit() >= self.thresholds.simulated_rate {
            return None;
        }
        let label_index = self.entropy.index(self.label_count);
        let confidence = self.entropy.between(
            self.thresholds.simulated_confidence_min,
            self.thresholds.simulated_confidence_max,
        );
        Some(Detection {
            label_index,
            confidence,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays fixed draws; `index` and `between` use the low end
    pub(crate) struct ScriptedEntropy {
        draws: VecDeque<f32>,
        fallback: f32,
    }

    impl ScriptedEntropy {
        pub(crate) fn new(draws: impl IntoIterator<Item = f32>, fallback: f32) -> Self {
            Self {
                draws: draws.into_iter().collect(),
                fallback,
            }
        }
    }

    impl Entropy for ScriptedEntropy {
        fn unit(&mut self) -> f32 {
            self.draws.pop_front().unwrap_or(self.fallback)
        }

        fn index(&mut self, _n: usize) -> usize {
            0
        }

        fn between(&mut self, low: f32, _high: f32) -> f32 {
            low
        }
    }

    #[test]
    fn test_detection_rate_and_confidence_range() {
        let mut backend = SimulatedBackend::with_entropy(
            15,
            ThresholdConfig::default(),
            Box::new(StdRng::seed_from_u64(42)),
        );

        let ticks = 20_000;
        let mut detections = 0;
        for _ in 0..ticks {
            if let Some(d) = backend.infer() {
                detections += 1;
                assert!(d.label_index < 15);
                assert!((0.85..=0.99).contains(&d.confidence), "confidence {}", d.confidence);
            }
        }

        let rate = detections as f32 / ticks as f32;
        assert!((rate - 0.05).abs() < 0.01, "rate {}", rate);
    }

    #[test]
    fn test_draw_at_rate_is_not_a_detection() {
        let mut backend = SimulatedBackend::with_entropy(
            3,
            ThresholdConfig::default(),
            Box::new(ScriptedEntropy::new([0.05, 0.049], 0.5)),
        );

        assert!(backend.infer().is_none());
        let detection = backend.infer().unwrap();
        assert_eq!(detection.label_index, 0);
        assert_eq!(detection.confidence, 0.85);
    }
}
