use super::mailbox::FrameMailbox;
use super::worker::{self, WorkerHandle};
use crate::config::FilterOptions;
use crate::debug::DebugSink;
use crate::error::PipelineError;
use crate::segmentation::{GeneratorSpec, MaskGenerator, MaskGeneratorFactory};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifecycle of the mask pipeline
///
/// ```text
/// Uninitialized --start--> Running | Degraded
/// Running --stop/restart--> Stopped --start--> Running | Degraded
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    /// Generator loaded and worker thread alive
    Running,
    /// No generator and no worker; frames pass through untouched
    Degraded { reason: String },
    /// Worker joined; its generator is retained until released
    Stopped,
}

/// What a call to [`PipelineController::restart`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    /// Same model identifier, nothing touched
    Unchanged,
    Restarted,
}

/// Owns the mask worker thread and the generator it runs
///
/// All methods run on the configuration thread. The generator is moved into
/// the worker while it runs and moved back when the worker is joined, so it
/// is never reachable from two threads, and a new generator is only built
/// after the old worker has exited and the old generator was dropped.
pub struct PipelineController {
    factory: Arc<dyn MaskGeneratorFactory>,
    mailbox: Arc<FrameMailbox>,
    model: String,
    target_width: u32,
    target_height: u32,
    threads: usize,
    data_dir: Option<PathBuf>,
    debug: DebugSink,
    generator: Option<Box<dyn MaskGenerator>>,
    worker: Option<WorkerHandle>,
    state: ControllerState,
    /// Mirrors `state == Running` for the video thread, which never locks
    running: Arc<AtomicBool>,
}

impl PipelineController {
    pub fn new(factory: Arc<dyn MaskGeneratorFactory>, options: &FilterOptions) -> Self {
        Self {
            factory,
            mailbox: Arc::new(FrameMailbox::new()),
            model: String::new(),
            target_width: options.target_width,
            target_height: options.target_height,
            threads: options.threads,
            data_dir: options.data_dir.clone(),
            debug: options.debug.clone(),
            generator: None,
            worker: None,
            state: ControllerState::Uninitialized,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Build a generator for `model` and start the worker
    ///
    /// Any running worker is stopped and its generator released first. On
    /// failure the controller is left `Degraded` and the error is returned
    /// for reporting; the controller stays usable.
    pub fn start(&mut self, model: &str) -> Result<(), PipelineError> {
        self.stop();
        self.release();
        self.model = model.to_owned();

        let spec = GeneratorSpec {
            model_path: crate::config::resolve_model_path(model, self.data_dir.as_deref()),
            threads: self.threads,
            width: self.target_width,
            height: self.target_height,
            debug: self.debug.clone(),
        };

        let generator = match self.factory.create(&spec) {
            Ok(generator) => generator,
            Err(err) => {
                tracing::warn!("Mask generator for {} unavailable: {}", model, err);
                self.state = ControllerState::Degraded {
                    reason: err.to_string(),
                };
                return Err(err.into());
            }
        };

        self.mailbox.reset();
        match worker::spawn(generator, Arc::clone(&self.mailbox), self.debug.clone()) {
            Ok(handle) => {
                self.worker = Some(handle);
                self.state = ControllerState::Running;
                self.running.store(true, Ordering::SeqCst);
                tracing::info!("Mask pipeline running with {}", model);
                Ok(())
            }
            Err(err) => {
                self.state = ControllerState::Degraded {
                    reason: format!("failed to spawn mask worker: {err}"),
                };
                Err(PipelineError::Spawn(err))
            }
        }
    }

    /// Signal the worker to exit and join it
    ///
    /// The running flag drops before the join, so the video thread passes
    /// frames through while this blocks. No-op when no worker is running.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        let Some(worker) = self.worker.take() else {
            return;
        };

        self.mailbox.request_shutdown();
        match worker.join() {
            Ok(generator) => {
                self.generator = Some(generator);
                self.state = ControllerState::Stopped;
                tracing::debug!("Mask worker joined");
            }
            Err(_) => {
                tracing::error!("Mask worker panicked");
                self.state = ControllerState::Degraded {
                    reason: "mask worker panicked".into(),
                };
            }
        }
    }

    /// Drop a retained generator (only present after `stop`)
    fn release(&mut self) {
        if self.generator.take().is_some() {
            tracing::debug!("Released mask generator for {}", self.model);
        }
    }

    /// Switch to another model
    ///
    /// Identical identifiers (string equality) are a no-op, whatever the
    /// current state. Otherwise runs stop, release, start.
    pub fn restart(&mut self, model: &str) -> Result<RestartOutcome, PipelineError> {
        if model == self.model {
            return Ok(RestartOutcome::Unchanged);
        }

        self.debug
            .emit(&format!("update: model: {} => {}", self.model, model));
        self.stop();
        self.release();
        self.start(model)?;
        Ok(RestartOutcome::Restarted)
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ControllerState::Running
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn target_size(&self) -> (u32, u32) {
        (self.target_width, self.target_height)
    }

    pub fn mailbox(&self) -> &Arc<FrameMailbox> {
        &self.mailbox
    }

    /// Flag the video thread polls instead of reading `state`
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }
}

impl Drop for PipelineController {
    fn drop(&mut self) {
        self.stop();
        self.release();
        self.state = ControllerState::Stopped;
    }
}
