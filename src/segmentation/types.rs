use crate::debug::DebugSink;
use crate::error::GeneratorError;
use image::{GrayImage, RgbImage};
use std::path::PathBuf;

/// Segmentation mask: 255 = subject, 0 = background
/// Dimensions are the generator's working resolution
pub type Mask = GrayImage;

/// Trait for mask generators
/// Allows swapping between different backends (ONNX models, test stubs, ...)
///
/// A generator is owned by exactly one thread at a time: the pipeline moves
/// it into the mask worker and takes it back when the worker is joined.
pub trait MaskGenerator: Send {
    /// Compute a mask for one frame
    ///
    /// # Arguments
    /// * `frame` - RGB frame at the generator's working resolution
    fn infer(&mut self, frame: &RgbImage) -> Result<Mask, GeneratorError>;

    /// Working resolution as (width, height)
    fn input_size(&self) -> (u32, u32);
}

/// Everything needed to construct a generator
#[derive(Debug, Clone)]
pub struct GeneratorSpec {
    pub model_path: PathBuf,
    pub threads: usize,
    pub width: u32,
    pub height: u32,
    pub debug: DebugSink,
}

/// Builds generators for the pipeline controller
///
/// Construction is expensive and happens synchronously on the
/// configuration thread. A failure leaves the filter degraded.
pub trait MaskGeneratorFactory: Send + Sync {
    fn create(&self, spec: &GeneratorSpec) -> Result<Box<dyn MaskGenerator>, GeneratorError>;
}

impl<F> MaskGeneratorFactory for F
where
    F: Fn(&GeneratorSpec) -> Result<Box<dyn MaskGenerator>, GeneratorError> + Send + Sync,
{
    fn create(&self, spec: &GeneratorSpec) -> Result<Box<dyn MaskGenerator>, GeneratorError> {
        self(spec)
    }
}
