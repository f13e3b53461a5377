//! Frame Module - Capture and preprocessing
//!
//! - `source` - FrameSource trait, replay and test-pattern sources
//! - `camera` - live camera source (feature `camera`)
//! - `preprocess` - frame to classifier tensor

pub mod preprocess;
pub mod source;

#[cfg(feature = "camera")]
pub mod camera;

pub use preprocess::{FramePreprocessor, PreprocessError};
pub use source::{Frame, FrameSource, ReplaySource, TestPatternSource};

use super::config::DetectorConfig;

/// Pick the frame source for this run: camera, then replay, then test pattern
pub fn open_default_source(config: &DetectorConfig) -> Box<dyn FrameSource> {
    #[cfg(feature = "camera")]
    {
        match camera::CameraSource::open(config.camera_index) {
            Ok(source) => return Box::new(source),
            Err(e) => log::warn!("Camera unavailable: {}", e),
        }
    }

    if let Some(path) = config.frames_path.as_deref() {
        match ReplaySource::open(path) {
            Ok(source) => return Box::new(source),
            Err(e) => log::warn!("Replay source unavailable: {}", e),
        }
    }

    log::warn!("No camera or replay frames configured - using test pattern");
    Box::new(TestPatternSource::new(640, 480))
}
