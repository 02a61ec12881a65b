use std::fmt;
use std::sync::Arc;

/// Text message callback handed to mask generators and the worker
///
/// Called from the configuration thread and the mask worker, so the
/// callback must be `Send + Sync`.
#[derive(Clone)]
pub struct DebugSink(Arc<dyn Fn(&str) + Send + Sync>);

impl DebugSink {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }

    /// Forward messages to `tracing` at info level
    pub fn tracing() -> Self {
        Self::new(|msg| tracing::info!(target: "backscrub", "{}", msg))
    }

    /// Drop every message
    pub fn silent() -> Self {
        Self::new(|_| {})
    }

    pub fn emit(&self, msg: &str) {
        (self.0)(msg)
    }
}

impl Default for DebugSink {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for DebugSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DebugSink")
    }
}
