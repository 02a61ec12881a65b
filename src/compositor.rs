//! Synchronous per-frame half of the filter.
//!
//! Runs on the video-delivery thread: converts the host frame, hands it to
//! the mailbox, and keys the frame with whatever mask is newest. It never
//! waits on the mask worker.

use crate::config::{ChromaPolicy, FilterOptions, KeyColor};
use crate::error::FrameError;
use crate::frame::{yuy2_to_rgb, VideoFormat, VideoFrame};
use crate::pipeline::FrameMailbox;
use crate::segmentation::Mask;
use image::imageops::{self, FilterType};
use std::collections::HashSet;

/// What the compositor did with a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A mask was blended into the frame
    Composited,
    /// No mask available yet; frame untouched
    PassThrough,
    /// Pixel format not handled; frame untouched
    Unsupported(VideoFormat),
    /// Buffer did not match its declared geometry; frame untouched
    Invalid,
}

pub struct Compositor {
    target_width: u32,
    target_height: u32,
    chroma_policy: ChromaPolicy,
    key: KeyColor,
    warned_formats: HashSet<VideoFormat>,
}

impl Compositor {
    pub fn new(options: &FilterOptions) -> Self {
        Self {
            target_width: options.target_width,
            target_height: options.target_height,
            chroma_policy: options.chroma_policy,
            key: options.key,
            warned_formats: HashSet::new(),
        }
    }

    /// Feed one frame to the mailbox and composite the latest mask into it
    pub fn process(&mut self, frame: &mut VideoFrame, mailbox: &FrameMailbox) -> FrameOutcome {
        if frame.format != VideoFormat::Yuy2 {
            self.report_unsupported(frame.format);
            return FrameOutcome::Unsupported(frame.format);
        }

        let rgb = match yuy2_to_rgb(frame) {
            Ok(rgb) => rgb,
            Err(err) => {
                tracing::warn!("Dropping malformed frame: {}", err);
                return FrameOutcome::Invalid;
            }
        };

        let input = if rgb.dimensions() != (self.target_width, self.target_height) {
            let _span = tracing::debug_span!("resize_input").entered();
            imageops::resize(
                &rgb,
                self.target_width,
                self.target_height,
                FilterType::Triangle,
            )
        } else {
            rgb
        };
        mailbox.publish(input);

        let mask = match mailbox.peek_mask() {
            Some(mask) if mask.width() > 0 && mask.height() > 0 => mask,
            _ => return FrameOutcome::PassThrough,
        };

        let mask = if mask.dimensions() != frame.dimensions() {
            let _span = tracing::debug_span!("resize_mask").entered();
            imageops::resize(&mask, frame.width, frame.height, FilterType::Triangle)
        } else {
            mask
        };

        match blend_yuy2(frame, &mask, self.chroma_policy, self.key) {
            Ok(()) => FrameOutcome::Composited,
            Err(err) => {
                tracing::warn!("Failed to composite frame: {}", err);
                FrameOutcome::Invalid
            }
        }
    }

    fn report_unsupported(&mut self, format: VideoFormat) {
        if self.warned_formats.insert(format) {
            tracing::warn!("filter_video: unsupported frame format: {}", format);
        } else {
            tracing::trace!("filter_video: unsupported frame format: {}", format);
        }
    }
}

/// Key the background of a YUY2 frame in place
///
/// `mask` must match the frame dimensions. Per pixel, with `m` the mask
/// value and `h = 255 - m`:
/// - luma becomes `round((Y*m + key.luma*h) / 255)`
/// - chroma follows `policy`: proportional mixes the same way toward
///   `key.chroma`, binary replaces it with `key.chroma` unless `m == 255`
///
/// Padding bytes past each row are left alone.
pub fn blend_yuy2(
    frame: &mut VideoFrame,
    mask: &Mask,
    policy: ChromaPolicy,
    key: KeyColor,
) -> Result<(), FrameError> {
    let _span = tracing::debug_span!("blend").entered();

    let (width, height) = (frame.width as usize, frame.height as usize);
    if mask.dimensions() != frame.dimensions() {
        return Err(FrameError::MaskSize {
            mask: mask.dimensions(),
            frame: frame.dimensions(),
        });
    }

    let plane = frame.packed_plane_mut()?;
    let linesize = plane.linesize;
    let mask = mask.as_raw();

    for y in 0..height {
        let row = &mut plane.data[y * linesize..y * linesize + width * 2];
        let weights = &mask[y * width..(y + 1) * width];
        for (pixel, &m) in row.chunks_exact_mut(2).zip(weights) {
            let h = 255 - m;
            pixel[0] = mix(pixel[0], key.luma, m);
            pixel[1] = match policy {
                ChromaPolicy::Proportional => mix(pixel[1], key.chroma, m),
                ChromaPolicy::Binary if h != 0 => key.chroma,
                ChromaPolicy::Binary => pixel[1],
            };
        }
    }

    Ok(())
}

/// Weighted mix of `value` and `key` with subject weight `m / 255`, rounded
#[inline]
fn mix(value: u8, key: u8, m: u8) -> u8 {
    let m = m as u32;
    let h = 255 - m;
    ((value as u32 * m + key as u32 * h + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use pretty_assertions::assert_eq;

    fn options(policy: ChromaPolicy) -> FilterOptions {
        FilterOptions {
            target_width: 4,
            target_height: 2,
            chroma_policy: policy,
            ..FilterOptions::default()
        }
    }

    fn pattern(width: u32, height: u32) -> VideoFrame {
        let data = (0..width * height * 2).map(|i| (i * 37 % 251) as u8).collect();
        VideoFrame::yuy2(width, height, data).unwrap()
    }

    #[test]
    fn mix_hits_both_extremes() {
        for value in [0, 1, 127, 200, 255] {
            assert_eq!(mix(value, 0, 255), value);
            assert_eq!(mix(value, 0, 0), 0);
            assert_eq!(mix(value, 16, 0), 16);
        }
        assert_eq!(mix(200, 0, 128), 100);
    }

    #[test]
    fn full_subject_mask_keeps_frame() {
        let mut frame = pattern(4, 2);
        let original = frame.clone();
        let mask = Mask::from_pixel(4, 2, Luma([255]));

        for policy in [ChromaPolicy::Proportional, ChromaPolicy::Binary] {
            blend_yuy2(&mut frame, &mask, policy, KeyColor::GREEN_SCREEN).unwrap();
            assert_eq!(frame, original);
        }
    }

    #[test]
    fn full_background_mask_keys_to_green() {
        for policy in [ChromaPolicy::Proportional, ChromaPolicy::Binary] {
            let mut frame = pattern(4, 2);
            let mask = Mask::from_pixel(4, 2, Luma([0]));
            blend_yuy2(&mut frame, &mask, policy, KeyColor::GREEN_SCREEN).unwrap();
            assert!(frame.planes[0].data.iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn proportional_chroma_feathers_edges() {
        let mut frame = VideoFrame::yuy2(2, 1, vec![200, 100, 200, 180]).unwrap();
        let mask = Mask::from_raw(2, 1, vec![128, 255]).unwrap();
        blend_yuy2(&mut frame, &mask, ChromaPolicy::Proportional, KeyColor::GREEN_SCREEN).unwrap();
        assert_eq!(frame.planes[0].data, vec![100, 50, 200, 180]);
    }

    #[test]
    fn binary_chroma_snaps_to_key() {
        let mut frame = VideoFrame::yuy2(2, 1, vec![200, 100, 200, 180]).unwrap();
        let mask = Mask::from_raw(2, 1, vec![254, 255]).unwrap();
        blend_yuy2(&mut frame, &mask, ChromaPolicy::Binary, KeyColor::GREEN_SCREEN).unwrap();
        assert_eq!(frame.planes[0].data, vec![199, 0, 200, 180]);
    }

    #[test]
    fn custom_key_color_is_reached() {
        let mut frame = pattern(2, 2);
        let key = KeyColor {
            luma: 16,
            chroma: 128,
        };
        blend_yuy2(&mut frame, &Mask::new(2, 2), ChromaPolicy::Proportional, key).unwrap();
        for pixel in frame.planes[0].data.chunks_exact(2) {
            assert_eq!(pixel, &[16, 128]);
        }
    }

    #[test]
    fn row_padding_is_untouched() {
        let data = vec![
            90, 90, 90, 90, 0xAB, 0xCD, // row 0 + padding
            90, 90, 90, 90,
        ];
        let mut frame = VideoFrame::yuy2_with_stride(2, 2, 6, data).unwrap();
        blend_yuy2(
            &mut frame,
            &Mask::new(2, 2),
            ChromaPolicy::Binary,
            KeyColor::GREEN_SCREEN,
        )
        .unwrap();
        assert_eq!(frame.planes[0].data, vec![0, 0, 0, 0, 0xAB, 0xCD, 0, 0, 0, 0]);
    }

    #[test]
    fn no_mask_passes_frame_through_untouched() {
        let mailbox = FrameMailbox::new();
        let mut compositor = Compositor::new(&options(ChromaPolicy::Proportional));
        let mut frame = pattern(8, 4);
        let original = frame.clone();

        assert_eq!(compositor.process(&mut frame, &mailbox), FrameOutcome::PassThrough);
        assert_eq!(frame, original);
        assert_eq!(mailbox.stats().frames_published, 1);
    }

    #[test]
    fn input_is_resized_to_target_before_publish() {
        let mailbox = FrameMailbox::new();
        let mut compositor = Compositor::new(&options(ChromaPolicy::Proportional));
        let mut frame = pattern(8, 4);
        compositor.process(&mut frame, &mailbox);

        match mailbox.wait_and_take() {
            crate::pipeline::Taken::Frame(published) => assert_eq!(published.dimensions(), (4, 2)),
            crate::pipeline::Taken::Cancelled => panic!("unexpected cancellation"),
        }
    }

    #[test]
    fn low_resolution_mask_is_scaled_up() {
        let mailbox = FrameMailbox::new();
        mailbox.publish_mask(Mask::new(4, 2));
        let mut compositor = Compositor::new(&options(ChromaPolicy::Binary));
        let mut frame = pattern(8, 4);

        assert_eq!(compositor.process(&mut frame, &mailbox), FrameOutcome::Composited);
        assert!(frame.planes[0].data.iter().all(|&b| b == 0));
    }

    #[test]
    fn unsupported_format_passes_through() {
        let mailbox = FrameMailbox::new();
        mailbox.publish_mask(Mask::new(4, 2));
        let mut compositor = Compositor::new(&options(ChromaPolicy::Proportional));
        let mut frame = pattern(4, 2);
        frame.format = VideoFormat::Nv12;
        let original = frame.clone();

        for _ in 0..2 {
            assert_eq!(
                compositor.process(&mut frame, &mailbox),
                FrameOutcome::Unsupported(VideoFormat::Nv12)
            );
        }
        assert_eq!(frame, original);
        assert_eq!(mailbox.stats().frames_published, 0);
    }

    #[test]
    fn malformed_frame_is_rejected_untouched() {
        let mailbox = FrameMailbox::new();
        let mut compositor = Compositor::new(&options(ChromaPolicy::Proportional));
        let mut frame = pattern(4, 2);
        frame.planes[0].data.truncate(5);
        let original = frame.clone();

        assert_eq!(compositor.process(&mut frame, &mailbox), FrameOutcome::Invalid);
        assert_eq!(frame, original);
    }
}
