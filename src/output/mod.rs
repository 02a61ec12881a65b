#[cfg(feature = "webcam")]
mod loopback;

#[cfg(feature = "webcam")]
pub use loopback::LoopbackOutput;

use crate::frame::VideoFrame;
use anyhow::Result;

/// Trait for output destinations
pub trait OutputSink {
    /// Write a filtered YUY2 frame
    fn write_frame(&mut self, frame: &VideoFrame) -> Result<()>;

    /// Get the expected output resolution
    fn resolution(&self) -> (u32, u32);
}

/// Row bytes of a packed frame with any stride padding removed
#[cfg(any(feature = "webcam", test))]
pub(crate) fn packed_rows(frame: &VideoFrame) -> Result<Vec<u8>> {
    let plane = frame.packed_plane()?;
    let row_bytes = frame.width.div_ceil(2) as usize * 4;
    let row_bytes = row_bytes.min(plane.linesize);

    let mut out = Vec::with_capacity(row_bytes * frame.height as usize);
    for y in 0..frame.height as usize {
        let start = y * plane.linesize;
        let end = (start + row_bytes).min(plane.data.len());
        out.extend_from_slice(&plane.data[start..end]);
    }
    Ok(out)
}
