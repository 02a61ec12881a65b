use super::types::Mask;
use crate::error::GeneratorError;
use image::{imageops, Luma, RgbImage};
use ndarray::Array4;

/// Preprocessor for converting RGB images to model input tensors
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// Preprocess an RGB image into a normalized NCHW tensor
    ///
    /// Frames normally arrive at the target size already; anything else is
    /// resized first.
    ///
    /// Returns: Array4<f32> with shape [1, 3, height, width], values in [0, 1]
    pub fn preprocess(&self, image: &RgbImage) -> Array4<f32> {
        let _span = tracing::debug_span!("preprocess").entered();

        let resized;
        let image = if image.dimensions() != (self.target_width, self.target_height) {
            resized = imageops::resize(
                image,
                self.target_width,
                self.target_height,
                imageops::FilterType::Triangle,
            );
            &resized
        } else {
            image
        };

        let (width, height) = image.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
        for (x, y, pixel) in image.enumerate_pixels() {
            for channel in 0..3 {
                tensor[[0, channel, y as usize, x as usize]] = pixel[channel] as f32 / 255.0;
            }
        }

        tensor
    }

    /// Quantize a row-major alpha matte in [0, 1] into a mask
    pub fn matte_to_mask(matte: &[f32], width: u32, height: u32) -> Result<Mask, GeneratorError> {
        let expected = width as usize * height as usize;
        if matte.len() < expected {
            return Err(GeneratorError::Inference(format!(
                "matte has {} values, expected {}",
                matte.len(),
                expected
            )));
        }

        Ok(Mask::from_fn(width, height, |x, y| {
            let idx = (y * width + x) as usize;
            Luma([(matte[idx] * 255.0).round().clamp(0.0, 255.0) as u8])
        }))
    }
}
