use crate::segmentation::Mask;
use image::RgbImage;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Result of [`FrameMailbox::wait_and_take`]
#[derive(Debug)]
pub enum Taken {
    /// The latest published frame. Empty (0x0) if a wake arrived before any
    /// frame was ever published.
    Frame(RgbImage),
    /// Shutdown was requested; nothing was consumed
    Cancelled,
}

/// Counters for observing how many frames the worker skipped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MailboxStats {
    pub frames_published: u64,
    pub frames_taken: u64,
    pub masks_published: u64,
}

impl MailboxStats {
    /// Frames overwritten before the worker got to them
    pub fn frames_dropped(&self) -> u64 {
        self.frames_published.saturating_sub(self.frames_taken)
    }
}

#[derive(Default)]
struct Slot {
    frame: Option<RgbImage>,
    mask: Option<Mask>,
    pending: bool,
    shutdown: bool,
    stats: MailboxStats,
}

/// Single-slot, latest-value-wins exchange between the video path and the
/// mask worker
///
/// Frames are never queued: a publish overwrites whatever the worker has not
/// consumed yet. Masks are read without being removed. Every operation holds
/// the lock only for a copy, except `wait_and_take`, which blocks and must
/// only be called from the worker thread.
#[derive(Default)]
pub struct FrameMailbox {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl FrameMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `frame` as the latest frame and wake the worker
    pub fn publish(&self, frame: RgbImage) {
        let mut slot = self.lock();
        slot.frame = Some(frame);
        slot.pending = true;
        slot.stats.frames_published += 1;
        self.ready.notify_one();
    }

    /// Block until a frame is pending or shutdown is requested
    ///
    /// Shutdown takes precedence over a pending frame.
    pub fn wait_and_take(&self) -> Taken {
        let mut slot = self.lock();
        while !slot.pending && !slot.shutdown {
            slot = self
                .ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if slot.shutdown {
            return Taken::Cancelled;
        }

        slot.pending = false;
        slot.stats.frames_taken += 1;
        Taken::Frame(slot.frame.take().unwrap_or_else(|| RgbImage::new(0, 0)))
    }

    /// Replace the latest mask
    pub fn publish_mask(&self, mask: Mask) {
        let mut slot = self.lock();
        slot.mask = Some(mask);
        slot.stats.masks_published += 1;
    }

    /// Copy of the latest mask, `None` until the first inference completes
    pub fn peek_mask(&self) -> Option<Mask> {
        self.lock().mask.clone()
    }

    /// Ask the worker to exit
    ///
    /// Marks the slot pending as well so a worker that re-checks only after
    /// a wake still observes the request.
    pub fn request_shutdown(&self) {
        let mut slot = self.lock();
        slot.shutdown = true;
        slot.pending = true;
        self.ready.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }

    /// Clear shutdown, pending state and the previous worker's mask before a
    /// worker (re)starts
    ///
    /// Any frame left in the slot is kept but is not consumed until the
    /// next publish.
    pub(crate) fn reset(&self) {
        let mut slot = self.lock();
        slot.shutdown = false;
        slot.pending = false;
        slot.mask = None;
    }

    pub fn stats(&self) -> MailboxStats {
        self.lock().stats
    }
}
