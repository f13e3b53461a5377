//! Gesture Label Set
//!
//! Fixed, ordered list of gesture names. Index position is the classifier's
//! class id, so the order must match the model's output vector.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::constants::DEFAULT_LABELS;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("failed to read label file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("label file {path} is not a JSON array of strings: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("label set is empty")]
    Empty,
}

/// Immutable label list, cheap to clone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelSet(Arc<[String]>);

impl LabelSet {
    pub fn new<I, S>(labels: I) -> Result<Self, LabelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(LabelError::Empty);
        }
        Ok(Self(labels.into()))
    }

    /// Load a JSON array of strings
    pub fn from_file(path: &Path) -> Result<Self, LabelError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| LabelError::Io {
            path: display.clone(),
            source,
        })?;
        let labels: Vec<String> =
            serde_json::from_str(&content).map_err(|source| LabelError::Parse {
                path: display,
                source,
            })?;
        Self::new(labels)
    }

    /// Label file when configured and valid, built-in list otherwise
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(path) => match Self::from_file(path) {
                Ok(labels) => {
                    log::info!("Loaded {} labels from {}", labels.len(), path.display());
                    labels
                }
                Err(e) => {
                    log::warn!("{} - using built-in labels", e);
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self(DEFAULT_LABELS.iter().map(|s| s.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_labels() {
        let labels = LabelSet::default();
        assert_eq!(labels.len(), 15);
        assert_eq!(labels.get(0), Some("Hello"));
        assert_eq!(labels.get(15), None);
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(LabelSet::new(Vec::<String>::new()), Err(LabelError::Empty)));
    }

    #[test]
    fn test_from_file_keeps_order() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"["Wave", "Point", "Fist"]"#).unwrap();

        let labels = LabelSet::from_file(file.path()).unwrap();
        assert_eq!(labels.iter().collect::<Vec<_>>(), vec!["Wave", "Point", "Fist"]);
    }

    #[test]
    fn test_bad_file_falls_back() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let labels = LabelSet::load_or_default(Some(file.path()));
        assert_eq!(labels, LabelSet::default());
    }
}
