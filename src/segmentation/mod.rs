#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
mod preprocess;
pub mod types;

#[cfg(feature = "onnx")]
pub use onnx::{OnnxMaskFactory, OnnxMaskGenerator};
#[cfg(feature = "onnx")]
pub use preprocess::Preprocessor;
pub use types::{GeneratorSpec, Mask, MaskGenerator, MaskGeneratorFactory};
