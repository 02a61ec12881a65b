//! Asynchronous half of the filter: the frame/mask mailbox, the mask worker
//! thread and the controller that owns both.

mod controller;
mod mailbox;
mod worker;

pub use controller::{ControllerState, PipelineController, RestartOutcome};
pub use mailbox::{FrameMailbox, MailboxStats, Taken};
