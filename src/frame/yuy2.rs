use super::{VideoFormat, VideoFrame};
use crate::error::FrameError;
use image::{Rgb, RgbImage};

/// Decode a packed YUY2 frame into RGB
///
/// Each `Y0 U Y1 V` macropixel yields two RGB pixels sharing one chroma
/// pair. On odd widths the trailing pixel reuses whatever chroma the row
/// carries, falling back to neutral.
pub fn yuy2_to_rgb(frame: &VideoFrame) -> Result<RgbImage, FrameError> {
    if frame.format != VideoFormat::Yuy2 {
        return Err(FrameError::UnsupportedFormat(frame.format));
    }
    let _span = tracing::debug_span!("yuy2_to_rgb").entered();

    let plane = frame.packed_plane()?;
    let (width, height) = frame.dimensions();
    let mut rgb = RgbImage::new(width, height);

    for y in 0..height {
        let start = y as usize * plane.linesize;
        let row = &plane.data[start..(start + plane.linesize).min(plane.data.len())];
        for x in 0..width {
            let base = (x as usize / 2) * 4;
            let luma = row[x as usize * 2];
            let u = row.get(base + 1).copied().unwrap_or(128);
            let v = row.get(base + 3).copied().unwrap_or(128);
            let (r, g, b) = yuv_to_rgb(luma, u, v);
            rgb.put_pixel(x, y, Rgb([r, g, b]));
        }
    }

    Ok(rgb)
}

/// Convert RGB frame to YUV422 (YUYV) format
/// v4l2loopback typically expects YUYV format
pub fn rgb_to_yuy2(rgb_image: &RgbImage) -> Vec<u8> {
    let (width, height) = rgb_image.dimensions();
    let mut yuyv = Vec::with_capacity((width.div_ceil(2) * 4 * height) as usize);

    for y in 0..height {
        for x in (0..width).step_by(2) {
            let pixel1 = rgb_image.get_pixel(x, y);
            let pixel2 = if x + 1 < width {
                rgb_image.get_pixel(x + 1, y)
            } else {
                pixel1
            };

            let (y1, u1, v1) = rgb_to_yuv(pixel1[0], pixel1[1], pixel1[2]);
            let (y2, u2, v2) = rgb_to_yuv(pixel2[0], pixel2[1], pixel2[2]);

            // Average U and V for the pair of pixels
            let u = ((u1 as u16 + u2 as u16) / 2) as u8;
            let v = ((v1 as u16 + v2 as u16) / 2) as u8;

            yuyv.extend_from_slice(&[y1, u, y2, v]);
        }
    }

    yuyv
}

/// Convert RGB to YUV color space (BT.601)
pub fn rgb_to_yuv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let r = r as f32;
    let g = g as f32;
    let b = b as f32;

    let y = (0.299 * r + 0.587 * g + 0.114 * b).clamp(0.0, 255.0) as u8;
    let u = ((-0.147 * r - 0.289 * g + 0.436 * b) + 128.0).clamp(0.0, 255.0) as u8;
    let v = ((0.615 * r - 0.515 * g - 0.100 * b) + 128.0).clamp(0.0, 255.0) as u8;

    (y, u, v)
}

/// Inverse of [`rgb_to_yuv`]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.140 * v).round().clamp(0.0, 255.0) as u8;
    let g = (y - 0.395 * u - 0.581 * v).round().clamp(0.0, 255.0) as u8;
    let b = (y + 2.032 * u).round().clamp(0.0, 255.0) as u8;

    (r, g, b)
}
