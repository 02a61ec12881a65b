use super::mailbox::{FrameMailbox, Taken};
use crate::debug::DebugSink;
use crate::segmentation::MaskGenerator;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// The worker hands its generator back when it exits
pub(crate) type WorkerHandle = JoinHandle<Box<dyn MaskGenerator>>;

pub(crate) fn spawn(
    generator: Box<dyn MaskGenerator>,
    mailbox: Arc<FrameMailbox>,
    debug: DebugSink,
) -> io::Result<WorkerHandle> {
    thread::Builder::new()
        .name("backscrub-mask".into())
        .spawn(move || run(generator, &mailbox, &debug))
}

/// Mask worker loop: wait for a frame, infer, publish the mask, repeat
///
/// Returns when the mailbox reports shutdown.
pub(crate) fn run(
    mut generator: Box<dyn MaskGenerator>,
    mailbox: &FrameMailbox,
    debug: &DebugSink,
) -> Box<dyn MaskGenerator> {
    debug.emit("mask_thread: starting..");

    let mut iterations = 0u64;
    loop {
        let frame = match mailbox.wait_and_take() {
            Taken::Frame(frame) => frame,
            Taken::Cancelled => break,
        };
        // can happen if we are woken before video starts
        if frame.width() == 0 || frame.height() == 0 {
            continue;
        }

        let _span = tracing::debug_span!("mask_iteration", iteration = iterations).entered();
        let started = Instant::now();
        match generator.infer(&frame) {
            Ok(mask) => mailbox.publish_mask(mask),
            Err(err) => tracing::warn!("Mask inference failed, keeping previous mask: {}", err),
        }
        iterations += 1;
        tracing::debug!(
            "Inference took {:.1}ms",
            started.elapsed().as_secs_f64() * 1000.0
        );
    }

    debug.emit(&format!("mask_thread: done after {} frames", iterations));
    generator
}
