mod yuy2;

pub use yuy2::{rgb_to_yuy2, rgb_to_yuv, yuv_to_rgb, yuy2_to_rgb};

use crate::error::FrameError;
use image::RgbImage;
use std::fmt;

/// Pixel layout of a host video frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoFormat {
    /// Packed 4:2:2, byte order `Y0 U Y1 V`
    Yuy2,
    /// Packed 4:2:2, byte order `U Y0 V Y1`
    Uyvy,
    /// Planar 4:2:0, interleaved chroma plane
    Nv12,
    /// Planar 4:2:0, three planes
    I420,
    /// Packed 8-bit RGBA
    Rgba,
}

impl VideoFormat {
    pub fn name(&self) -> &'static str {
        match self {
            VideoFormat::Yuy2 => "YUY2",
            VideoFormat::Uyvy => "UYVY",
            VideoFormat::Nv12 => "NV12",
            VideoFormat::I420 => "I420",
            VideoFormat::Rgba => "RGBA",
        }
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One image plane: raw bytes plus the distance between row starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    pub data: Vec<u8>,
    pub linesize: usize,
}

/// Frame descriptor exchanged with the host
///
/// The filter mutates `planes` in place when it composites a mask, so the
/// frame handed back to the host is the same buffer it delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub format: VideoFormat,
    pub width: u32,
    pub height: u32,
    pub planes: Vec<Plane>,
}

impl VideoFrame {
    /// Wrap a tightly packed YUY2 buffer
    pub fn yuy2(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        Self::yuy2_with_stride(width, height, width as usize * 2, data)
    }

    /// Wrap a YUY2 buffer whose rows may carry trailing padding
    pub fn yuy2_with_stride(
        width: u32,
        height: u32,
        linesize: usize,
        data: Vec<u8>,
    ) -> Result<Self, FrameError> {
        let frame = Self {
            format: VideoFormat::Yuy2,
            width,
            height,
            planes: vec![Plane { data, linesize }],
        };
        frame.packed_plane()?;
        Ok(frame)
    }

    /// Encode an RGB image as a packed YUY2 frame
    pub fn from_rgb(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let linesize = width.div_ceil(2) as usize * 4;
        Self {
            format: VideoFormat::Yuy2,
            width,
            height,
            planes: vec![Plane {
                data: rgb_to_yuy2(image),
                linesize,
            }],
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// First plane of a packed 4:2:2 frame, checked against the frame geometry
    pub(crate) fn packed_plane(&self) -> Result<&Plane, FrameError> {
        let plane = self.planes.first().ok_or(FrameError::MissingPlane)?;
        check_packed(plane, self.width, self.height)?;
        Ok(plane)
    }

    pub(crate) fn packed_plane_mut(&mut self) -> Result<&mut Plane, FrameError> {
        let (width, height) = (self.width, self.height);
        let plane = self.planes.first_mut().ok_or(FrameError::MissingPlane)?;
        check_packed(plane, width, height)?;
        Ok(plane)
    }
}

fn check_packed(plane: &Plane, width: u32, height: u32) -> Result<(), FrameError> {
    if width == 0 || height == 0 {
        return Err(FrameError::Empty);
    }
    let row_bytes = width as usize * 2;
    if plane.linesize < row_bytes {
        return Err(FrameError::Stride {
            linesize: plane.linesize,
            row_bytes,
        });
    }
    let needed = plane.linesize * (height as usize - 1) + row_bytes;
    if plane.data.len() < needed {
        return Err(FrameError::BufferTooSmall {
            needed,
            actual: plane.data.len(),
        });
    }
    Ok(())
}
