#[cfg(feature = "webcam")]
mod v4l_capture;

#[cfg(feature = "webcam")]
pub use v4l_capture::WebcamCapture;

use crate::frame::VideoFrame;
use anyhow::Result;
use image::{Rgb, RgbImage};

/// Trait for frame sources feeding the filter
pub trait CaptureSource {
    /// Capture a single YUY2 frame at `resolution()`
    fn capture_frame(&mut self) -> Result<VideoFrame>;

    /// Get the resolution of delivered frames
    fn resolution(&self) -> (u32, u32);
}

/// Moving colour bars, for running without a camera
pub struct TestPattern {
    width: u32,
    height: u32,
    tick: u32,
}

impl TestPattern {
    const BARS: [[u8; 3]; 7] = [
        [192, 192, 192],
        [192, 192, 0],
        [0, 192, 192],
        [0, 192, 0],
        [192, 0, 192],
        [192, 0, 0],
        [0, 0, 192],
    ];

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tick: 0,
        }
    }

    fn render(&self) -> RgbImage {
        let bar_width = self.width.div_ceil(Self::BARS.len() as u32).max(1);
        RgbImage::from_fn(self.width, self.height, |x, _| {
            let bar = ((x + self.tick) / bar_width) as usize % Self::BARS.len();
            Rgb(Self::BARS[bar])
        })
    }
}

impl CaptureSource for TestPattern {
    fn capture_frame(&mut self) -> Result<VideoFrame> {
        let frame = VideoFrame::from_rgb(&self.render());
        self.tick = self.tick.wrapping_add(4);
        Ok(frame)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
