use crate::frame::VideoFormat;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while building or running a mask generator
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("failed to load model from {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error(
        "model expects {expected_width}x{expected_height} input but the filter runs at {width}x{height}"
    )]
    InputSizeMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Failures of the pipeline controller
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error("failed to spawn mask worker")]
    Spawn(#[source] std::io::Error),
}

/// Per-frame failures; the compositor absorbs all of these
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("unsupported frame format: {0}")]
    UnsupportedFormat(VideoFormat),

    #[error("frame has no planes")]
    MissingPlane,

    #[error("frame has zero width or height")]
    Empty,

    #[error("linesize {linesize} is shorter than a row ({row_bytes} bytes)")]
    Stride { linesize: usize, row_bytes: usize },

    #[error("frame buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("mask is {}x{} but the frame is {}x{}", mask.0, mask.1, frame.0, frame.1)]
    MaskSize { mask: (u32, u32), frame: (u32, u32) },
}
