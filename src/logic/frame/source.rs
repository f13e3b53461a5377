//! Frame Sources
//!
//! A source hands out the current raw frame, or `None` while the device is
//! not ready yet. Callers skip the tick on `None`; it is never an error.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use thiserror::Error;

/// Raw RGB frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub id: u64,
    pub image: RgbImage,
}

impl Frame {
    pub fn new(id: u64, image: RgbImage) -> Self {
        Self { id, image }
    }

    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

pub trait FrameSource: Send {
    /// Current frame, `None` while unavailable
    fn current_frame(&mut self) -> Option<Frame>;

    /// Short description for logs
    fn describe(&self) -> String;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("no decodable images under {0}")]
    Empty(String),
}

// ============================================================================
// REPLAY
// ============================================================================

/// Cycles through still images (a single file or every image in a directory)
pub struct ReplaySource {
    origin: PathBuf,
    frames: Vec<RgbImage>,
    cursor: usize,
    next_id: u64,
}

impl ReplaySource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let files = if path.is_dir() {
            let entries = std::fs::read_dir(path).map_err(|source| SourceError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let mut files: Vec<PathBuf> = entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| is_image_file(p))
                .collect();
            files.sort();
            files
        } else {
            vec![path.to_path_buf()]
        };

        let mut frames = Vec::with_capacity(files.len());
        for file in &files {
            let image = image::open(file).map_err(|source| SourceError::Decode {
                path: file.display().to_string(),
                source,
            })?;
            frames.push(image.to_rgb8());
        }

        if frames.is_empty() {
            return Err(SourceError::Empty(path.display().to_string()));
        }

        log::info!("Replay source ready: {} frame(s) from {}", frames.len(), path.display());

        Ok(Self::from_images(path.to_path_buf(), frames))
    }

    pub fn from_images(origin: PathBuf, frames: Vec<RgbImage>) -> Self {
        Self {
            origin,
            frames,
            cursor: 0,
            next_id: 0,
        }
    }
}

impl FrameSource for ReplaySource {
    fn current_frame(&mut self) -> Option<Frame> {
        if self.frames.is_empty() {
            return None;
        }
        let image = self.frames[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        let id = self.next_id;
        self.next_id += 1;
        Some(Frame::new(id, image))
    }

    fn describe(&self) -> String {
        format!("replay:{}", self.origin.display())
    }
}

fn is_image_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("png" | "jpg" | "jpeg")
    )
}

// ============================================================================
// TEST PATTERN
// ============================================================================

/// Mid-grey frames; becomes ready after `warmup` polls
pub struct TestPatternSource {
    width: u32,
    height: u32,
    warmup: u32,
    polls: u64,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_warmup(width, height, 0)
    }

    /// Unavailable for the first `warmup` polls, like a device still loading
    pub fn with_warmup(width: u32, height: u32, warmup: u32) -> Self {
        Self {
            width,
            height,
            warmup,
            polls: 0,
        }
    }
}

impl FrameSource for TestPatternSource {
    fn current_frame(&mut self) -> Option<Frame> {
        let poll = self.polls;
        self.polls += 1;
        if poll < self.warmup as u64 {
            return None;
        }
        Some(Frame::new(
            poll,
            RgbImage::from_pixel(self.width, self.height, Rgb([128, 128, 128])),
        ))
    }

    fn describe(&self) -> String {
        format!("pattern:{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_pattern_warmup() {
        let mut source = TestPatternSource::with_warmup(8, 6, 2);
        assert!(source.current_frame().is_none());
        assert!(source.current_frame().is_none());

        let frame = source.current_frame().unwrap();
        assert_eq!(frame.size(), (8, 6));
    }

    #[test]
    fn test_replay_directory_cycles_in_order() {
        let dir = tempdir().unwrap();
        RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]))
            .save(dir.path().join("a.png"))
            .unwrap();
        RgbImage::from_pixel(4, 4, Rgb([0, 0, 255]))
            .save(dir.path().join("b.png"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let mut source = ReplaySource::open(dir.path()).unwrap();
        let first = source.current_frame().unwrap();
        let second = source.current_frame().unwrap();
        let third = source.current_frame().unwrap();

        assert_eq!(first.image.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(second.image.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(third.image.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(third.id, 2);
    }

    #[test]
    fn test_replay_empty_directory() {
        let dir = tempdir().unwrap();
        assert!(matches!(ReplaySource::open(dir.path()), Err(SourceError::Empty(_))));
    }
}
