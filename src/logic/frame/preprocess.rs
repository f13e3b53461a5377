//! Frame Preprocessor
//!
//! Resize to the classifier input, scale 8-bit channels into [0, 1] and add
//! the batch axis: `[1, H, W, 3]`. The resized image is dropped before
//! returning; only the output tensor leaves this module.

use image::imageops::{self, FilterType};
use ndarray::Array4;
use thiserror::Error;

use super::source::Frame;
use crate::logic::model::buffer::{BufferLedger, FrameTensor};

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("empty frame ({0}x{1})")]
    EmptyFrame(u32, u32),
    #[error("tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub struct FramePreprocessor {
    width: u32,
    height: u32,
    ledger: BufferLedger,
}

impl FramePreprocessor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ledger: BufferLedger::new(),
        }
    }

    /// Square input, e.g. 224x224
    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    pub fn ledger(&self) -> &BufferLedger {
        &self.ledger
    }

    pub fn preprocess(&self, frame: &Frame) -> Result<FrameTensor, PreprocessError> {
        let (w, h) = frame.size();
        if w == 0 || h == 0 {
            return Err(PreprocessError::EmptyFrame(w, h));
        }

        let resized = imageops::resize(&frame.image, self.width, self.height, FilterType::Triangle);
        let _resized_lease = self.ledger.lease();

        // RgbImage is row-major HWC, the same layout as the tensor
        let normalized: Vec<f32> = resized.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
        let data = Array4::from_shape_vec(
            (1, self.height as usize, self.width as usize, 3),
            normalized,
        )?;

        Ok(FrameTensor::new(data, self.ledger.lease()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_shape_and_range() {
        let pre = FramePreprocessor::square(224);
        let frame = Frame::new(0, RgbImage::from_pixel(640, 480, Rgb([255, 0, 51])));

        let tensor = pre.preprocess(&frame).unwrap();
        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);

        let data = tensor.data();
        assert!((data[[0, 10, 10, 0]] - 1.0).abs() < 1e-6);
        assert!(data[[0, 10, 10, 1]].abs() < 1e-6);
        assert!((data[[0, 10, 10, 2]] - 0.2).abs() < 1e-6);
        assert!(data.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_buffers_released() {
        let pre = FramePreprocessor::new(32, 24);
        let frame = Frame::new(0, RgbImage::new(100, 80));

        for _ in 0..50 {
            let tensor = pre.preprocess(&frame).unwrap();
            assert_eq!(tensor.shape(), &[1, 24, 32, 3]);
            assert_eq!(pre.ledger().live(), 1);
        }

        assert_eq!(pre.ledger().live(), 0);
        assert_eq!(pre.ledger().total(), 100);
    }

    #[test]
    fn test_empty_frame_rejected() {
        let pre = FramePreprocessor::square(8);
        let frame = Frame::new(0, RgbImage::new(0, 0));
        assert!(matches!(pre.preprocess(&frame), Err(PreprocessError::EmptyFrame(0, 0))));
        assert_eq!(pre.ledger().live(), 0);
    }
}
