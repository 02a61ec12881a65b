//! Real-time background removal for live video.
//!
//! Frames arrive on the video thread and are keyed synchronously by the
//! [`Compositor`](compositor::Compositor) using the newest available mask.
//! Masks are produced asynchronously by a dedicated worker thread that
//! always segments the latest frame, so slow inference never stalls video.

pub mod capture;
pub mod compositor;
pub mod config;
pub mod debug;
pub mod error;
pub mod filter;
pub mod frame;
pub mod output;
pub mod pipeline;
pub mod segmentation;

pub use compositor::{Compositor, FrameOutcome};
pub use config::{ChromaPolicy, FilterOptions, KeyColor, Settings};
pub use debug::DebugSink;
pub use error::{FrameError, GeneratorError, PipelineError};
pub use filter::{BackscrubFilter, VideoPath};
pub use frame::{VideoFormat, VideoFrame};
pub use pipeline::{ControllerState, FrameMailbox, PipelineController, RestartOutcome};
pub use segmentation::{GeneratorSpec, Mask, MaskGenerator, MaskGeneratorFactory};
