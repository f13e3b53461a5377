//! Prediction Store & Error Reporter
//!
//! Latest accepted prediction (overwritten in place, no smoothing) and the
//! single current error notice. Advisories expire on their own; fatal
//! notices stay until detection is started again.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Latest accepted detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub label_index: usize,
    pub confidence: f32,
}

#[derive(Debug, Default)]
pub struct PredictionStore {
    current: Option<Prediction>,
}

impl PredictionStore {
    /// Unconditional overwrite
    pub fn record(&mut self, label: &str, label_index: usize, confidence: f32) -> Prediction {
        let prediction = Prediction {
            label: label.to_string(),
            label_index,
            confidence: confidence.clamp(0.0, 1.0),
        };
        self.current = Some(prediction.clone());
        prediction
    }

    /// Returns whether a prediction was present
    pub fn clear(&mut self) -> bool {
        self.current.take().is_some()
    }

    pub fn current(&self) -> Option<&Prediction> {
        self.current.as_ref()
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// Self-clears after the reporter's TTL
    Advisory,
    /// Stays until explicitly cleared
    Fatal,
}

#[derive(Debug, Clone)]
pub struct ErrorNotice {
    pub message: String,
    pub severity: ErrorSeverity,
    expires_at: Option<Instant>,
}

impl ErrorNotice {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[derive(Debug)]
pub struct ErrorReporter {
    ttl: Duration,
    current: Option<ErrorNotice>,
}

impl ErrorReporter {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    /// Replace the current notice; an advisory (re)starts the expiry timer
    pub fn raise(&mut self, message: impl Into<String>, severity: ErrorSeverity) {
        let now = Instant::now();
        let expires_at = match severity {
            ErrorSeverity::Advisory => Some(now + self.ttl),
            ErrorSeverity::Fatal => None,
        };
        self.current = Some(ErrorNotice {
            message: message.into(),
            severity,
            expires_at,
        });
    }

    /// Current notice, dropping it first if it has expired
    pub fn current(&mut self) -> Option<&ErrorNotice> {
        self.purge_expired(Instant::now());
        self.current.as_ref()
    }

    pub fn message(&mut self) -> Option<String> {
        self.current().map(|n| n.message.clone())
    }

    pub fn purge_expired(&mut self, now: Instant) {
        if self.current.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.current = None;
        }
    }

    /// Drop the notice only if it is fatal
    pub fn clear_fatal(&mut self) {
        if self
            .current
            .as_ref()
            .is_some_and(|n| n.severity == ErrorSeverity::Fatal)
        {
            self.current = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_overwrites() {
        let mut store = PredictionStore::default();
        store.record("Hello", 0, 0.9);
        store.record("Yes", 2, 0.7);

        let current = store.current().unwrap();
        assert_eq!(current.label, "Yes");
        assert_eq!(current.label_index, 2);
        assert!(store.clear());
        assert!(store.current().is_none());
        assert!(!store.clear());
    }

    #[tokio::test(start_paused = true)]
    async fn test_advisory_expires() {
        let mut errors = ErrorReporter::new(Duration::from_secs(5));
        errors.raise("model missing", ErrorSeverity::Advisory);
        assert_eq!(errors.message().as_deref(), Some("model missing"));

        tokio::time::advance(Duration::from_millis(4_999)).await;
        assert!(errors.message().is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(errors.message().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_advisory_restarts_timer() {
        let mut errors = ErrorReporter::new(Duration::from_secs(5));
        errors.raise("first", ErrorSeverity::Advisory);

        tokio::time::advance(Duration::from_secs(3)).await;
        errors.raise("second", ErrorSeverity::Advisory);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(errors.message().as_deref(), Some("second"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(errors.message().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_persists() {
        let mut errors = ErrorReporter::new(Duration::from_secs(5));
        errors.raise("backend fault", ErrorSeverity::Fatal);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(errors.message().as_deref(), Some("backend fault"));

        errors.clear_fatal();
        assert!(errors.message().is_none());
    }

    #[test]
    fn test_clear_fatal_keeps_advisory() {
        let mut errors = ErrorReporter::new(Duration::from_secs(5));
        errors.raise("advisory", ErrorSeverity::Advisory);
        errors.clear_fatal();
        assert_eq!(errors.message().as_deref(), Some("advisory"));
    }
}
