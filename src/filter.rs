//! Host-facing filter: configuration callbacks plus per-frame processing.
//!
//! A [`BackscrubFilter`] belongs to the configuration thread. The video
//! thread gets its own [`VideoPath`], which shares only the mailbox and a
//! running flag with the controller, so a model reload never stalls frames.

use crate::compositor::{Compositor, FrameOutcome};
use crate::config::{self, FilterOptions, PropertyDescriptor, Settings};
use crate::debug::DebugSink;
use crate::frame::VideoFrame;
use crate::pipeline::{ControllerState, FrameMailbox, PipelineController, RestartOutcome};
use crate::segmentation::MaskGeneratorFactory;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const NAME: &str = "Background scrubber";

/// Video-thread half of a filter instance
///
/// Never touches the controller: while the pipeline is stopped, restarting
/// or degraded, frames pass through untouched.
pub struct VideoPath {
    mailbox: Arc<FrameMailbox>,
    running: Arc<AtomicBool>,
    compositor: Compositor,
}

impl VideoPath {
    /// Process one frame in place
    pub fn filter_video(&mut self, frame: &mut VideoFrame) -> FrameOutcome {
        if !self.running.load(Ordering::SeqCst) {
            return FrameOutcome::PassThrough;
        }
        self.compositor.process(frame, &self.mailbox)
    }

    pub fn mailbox(&self) -> &Arc<FrameMailbox> {
        &self.mailbox
    }
}

/// One background-removal filter instance
///
/// `update` and drop run on the configuration thread and may block while the
/// mask worker is joined or a model loads. Hosts that deliver video on
/// another thread hand it a [`VideoPath`] from [`BackscrubFilter::video_path`];
/// single-threaded hosts can call [`BackscrubFilter::filter_video`] directly.
pub struct BackscrubFilter {
    controller: PipelineController,
    video: VideoPath,
    options: FilterOptions,
    debug: DebugSink,
}

impl BackscrubFilter {
    pub fn name() -> &'static str {
        NAME
    }

    pub fn defaults() -> Settings {
        Settings::default()
    }

    pub fn properties() -> Vec<PropertyDescriptor> {
        config::properties()
    }

    /// Create an instance and load its model synchronously
    ///
    /// A model that fails to load still yields an instance, in the degraded
    /// state, so the host can show it and the user can fix the setting.
    pub fn create(
        settings: &Settings,
        factory: Arc<dyn MaskGeneratorFactory>,
        options: FilterOptions,
    ) -> Self {
        let debug = options.debug.clone();
        debug.emit("create");

        let mut controller = PipelineController::new(factory, &options);
        match controller.start(&settings.model) {
            Ok(()) => debug.emit("create: done"),
            Err(err) => debug.emit(&format!("oops initialising backscrub: {err}")),
        }

        let video = VideoPath {
            mailbox: Arc::clone(controller.mailbox()),
            running: controller.running_flag(),
            compositor: Compositor::new(&options),
        };
        Self {
            controller,
            video,
            options,
            debug,
        }
    }

    /// A new handle for the video thread, with its own compositor
    pub fn video_path(&self) -> VideoPath {
        VideoPath {
            mailbox: Arc::clone(self.controller.mailbox()),
            running: self.controller.running_flag(),
            compositor: Compositor::new(&self.options),
        }
    }

    /// Apply new settings; reloads the model only if it changed
    pub fn update(&mut self, settings: &Settings) {
        match self.controller.restart(&settings.model) {
            Ok(RestartOutcome::Unchanged) => {}
            Ok(RestartOutcome::Restarted) => self.debug.emit("update: done"),
            Err(err) => self.debug.emit(&format!("oops re-initialising backscrub: {err}")),
        }
    }

    /// Process one frame in place on the instance's own [`VideoPath`]
    pub fn filter_video(&mut self, frame: &mut VideoFrame) -> FrameOutcome {
        self.video.filter_video(frame)
    }

    pub fn state(&self) -> &ControllerState {
        self.controller.state()
    }

    /// Human-readable reason the filter is degraded, if it is
    pub fn status(&self) -> Option<&str> {
        match self.controller.state() {
            ControllerState::Degraded { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn model(&self) -> &str {
        self.controller.model()
    }

    pub fn mailbox(&self) -> &Arc<FrameMailbox> {
        self.controller.mailbox()
    }
}

impl Drop for BackscrubFilter {
    fn drop(&mut self) {
        self.debug.emit("destroy");
        self.controller.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeneratorError;
    use crate::segmentation::{GeneratorSpec, MaskGenerator};

    fn failing_factory() -> Arc<dyn MaskGeneratorFactory> {
        Arc::new(|spec: &GeneratorSpec| -> Result<Box<dyn MaskGenerator>, GeneratorError> {
            Err(GeneratorError::ModelNotFound(spec.model_path.clone()))
        })
    }

    #[test]
    fn schema_and_defaults_come_from_config() {
        assert_eq!(BackscrubFilter::name(), "Background scrubber");
        assert_eq!(BackscrubFilter::defaults(), Settings::default());
        assert_eq!(BackscrubFilter::properties(), config::properties());
    }

    #[test]
    fn degraded_instance_passes_frames_through() {
        let options = FilterOptions {
            debug: DebugSink::silent(),
            ..FilterOptions::default()
        };
        let mut filter = BackscrubFilter::create(&Settings::new("nope.onnx"), failing_factory(), options);

        assert!(filter.status().unwrap().contains("nope.onnx"));
        assert_eq!(filter.model(), "nope.onnx");

        let mut frame = VideoFrame::yuy2(2, 2, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let original = frame.clone();
        assert_eq!(filter.filter_video(&mut frame), FrameOutcome::PassThrough);
        assert_eq!(frame, original);
        assert_eq!(filter.mailbox().stats().frames_published, 0);

        let mut video = filter.video_path();
        assert_eq!(video.filter_video(&mut frame), FrameOutcome::PassThrough);
        assert_eq!(frame, original);
    }
}
