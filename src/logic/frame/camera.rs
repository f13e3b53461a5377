//! Camera capture (feature `camera`).
//!
//! A background thread keeps decoding frames from the default camera and
//! publishes the latest one. The source reports no frame until the first
//! frame has decoded, which is when the device has both format metadata
//! and pixel data.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use parking_lot::Mutex;
use thiserror::Error;

use super::source::{Frame, FrameSource};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera {index}: {message}")]
    Device { index: u32, message: String },
    #[error("failed to spawn capture thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub struct CameraSource {
    index: u32,
    latest: Arc<Mutex<Option<Frame>>>,
    stop: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl CameraSource {
    /// Opens the device on the capture thread and waits until it reports
    /// whether the stream started.
    pub fn open(index: u32) -> Result<Self, CaptureError> {
        let latest = Arc::new(Mutex::new(None));
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker = {
            let latest = Arc::clone(&latest);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("camera-capture".to_string())
                .spawn(move || match open_camera(index) {
                    Ok(camera) => {
                        let _ = ready_tx.send(Ok(()));
                        capture_loop(camera, index, latest, stop);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                })?
        };

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                index,
                latest,
                stop,
                worker: Some(worker),
            }),
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                Err(CaptureError::Device {
                    index,
                    message: "capture thread exited before reporting".to_string(),
                })
            }
        }
    }
}

fn open_camera(index: u32) -> Result<Camera, CaptureError> {
    let device_err = |e: nokhwa::NokhwaError| CaptureError::Device {
        index,
        message: e.to_string(),
    };

    let requested =
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
    let mut camera = Camera::new(CameraIndex::Index(index), requested).map_err(device_err)?;
    camera.open_stream().map_err(device_err)?;

    log::info!("Camera {} opened ({})", index, camera.camera_format());
    Ok(camera)
}

fn capture_loop(
    mut camera: Camera,
    index: u32,
    latest: Arc<Mutex<Option<Frame>>>,
    stop: Arc<AtomicBool>,
) {
    let mut next_id = 0u64;
    while !stop.load(Ordering::Relaxed) {
        let decoded = camera
            .frame()
            .and_then(|buffer| buffer.decode_image::<RgbFormat>());
        match decoded {
            Ok(decoded) => {
                let (width, height) = (decoded.width(), decoded.height());
                if let Some(image) = RgbImage::from_raw(width, height, decoded.into_raw()) {
                    *latest.lock() = Some(Frame::new(next_id, image));
                    next_id += 1;
                }
            }
            Err(e) => log::debug!("Camera {} frame dropped: {}", index, e),
        }
    }

    if let Err(e) = camera.stop_stream() {
        log::warn!("Camera {} stop failed: {}", index, e);
    }
}

impl FrameSource for CameraSource {
    fn current_frame(&mut self) -> Option<Frame> {
        self.latest.lock().clone()
    }

    fn describe(&self) -> String {
        format!("camera:{}", self.index)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
