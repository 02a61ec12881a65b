use super::{packed_rows, OutputSink};
use crate::frame::VideoFrame;
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use v4l::video::Output;
use v4l::{Device, FourCC};

/// Raw YUYV frames written to a v4l2loopback device
pub struct LoopbackOutput {
    file: File,
    width: u32,
    height: u32,
}

impl LoopbackOutput {
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening v4l2loopback device at {} ({}x{})",
            path.display(),
            width,
            height
        );

        // announce the format before any frame is written
        let device = Device::with_path(path)
            .with_context(|| format!("Failed to open v4l2 device at {}", path.display()))?;
        let mut format = Output::format(&device).context("Failed to query output format")?;
        format.width = width;
        format.height = height;
        format.fourcc = FourCC::new(b"YUYV");
        let format = Output::set_format(&device, &format).context("Failed to set output format")?;
        tracing::debug!("Loopback format: {:?}", format);

        let file = File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open v4l2loopback device at {}", path.display()))?;

        tracing::info!("v4l2loopback device opened successfully");

        Ok(Self {
            file,
            width,
            height,
        })
    }
}

impl OutputSink for LoopbackOutput {
    fn write_frame(&mut self, frame: &VideoFrame) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            bail!(
                "Frame is {}x{}, device expects {}x{}",
                frame.width,
                frame.height,
                self.width,
                self.height
            );
        }

        let data = packed_rows(frame)?;
        self.file
            .write_all(&data)
            .context("Failed to write frame to v4l2loopback device")?;

        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
