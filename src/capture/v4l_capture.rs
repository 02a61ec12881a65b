use super::CaptureSource;
use crate::frame::VideoFrame;
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;

/// Webcam frames, decoded and re-encoded as YUY2 at a fixed size
pub struct WebcamCapture {
    camera: Camera,
    width: u32,
    height: u32,
}

impl WebcamCapture {
    /// Open a camera, asking for the highest frame rate at `width`x`height`
    ///
    /// The camera may settle on another resolution; frames are then scaled
    /// to the requested size.
    pub fn new(device_index: u32, width: u32, height: u32) -> Result<Self> {
        tracing::info!(
            "Initializing webcam {} at {}x{}",
            device_index,
            width,
            height
        );

        let index = CameraIndex::Index(device_index);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::HighestResolution(
            Resolution::new(width, height),
        ));

        let mut camera = Camera::new(index, requested).context("Failed to open camera")?;
        camera
            .open_stream()
            .context("Failed to open camera stream")?;

        let actual = camera.resolution();
        if (actual.width(), actual.height()) != (width, height) {
            tracing::warn!(
                "Camera delivers {}x{}, scaling to {}x{}",
                actual.width(),
                actual.height(),
                width,
                height
            );
        }

        Ok(Self {
            camera,
            width,
            height,
        })
    }
}

impl CaptureSource for WebcamCapture {
    fn capture_frame(&mut self) -> Result<VideoFrame> {
        let frame = self.camera.frame().context("Failed to capture frame")?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .context("Failed to decode frame")?;

        let rgb = if decoded.dimensions() != (self.width, self.height) {
            imageops::resize(&decoded, self.width, self.height, FilterType::Triangle)
        } else {
            decoded
        };

        Ok(VideoFrame::from_rgb(&rgb))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
