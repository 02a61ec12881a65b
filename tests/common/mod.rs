#![allow(dead_code)]

use backscrub::{GeneratorError, GeneratorSpec, Mask, MaskGenerator, MaskGeneratorFactory};
use image::{Luma, RgbImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Generator lifecycle events, in the order they happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Created(String),
    Inferred { model: String, value: u8 },
    Dropped(String),
}

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Event>>>);

impl Journal {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn inferences(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Inferred { value, .. } => Some(value),
                _ => None,
            })
            .collect()
    }
}

/// What the stub answers with
#[derive(Clone, Copy)]
pub enum Answer {
    /// Uniform mask of this value
    Fill(u8),
    /// Uniform mask of the frame's red value at (0, 0)
    Echo,
}

pub struct StubGenerator {
    model: String,
    answer: Answer,
    size: (u32, u32),
    journal: Journal,
    gate: Option<Receiver<()>>,
    infer_delay: Duration,
}

impl MaskGenerator for StubGenerator {
    fn infer(&mut self, frame: &RgbImage) -> Result<Mask, GeneratorError> {
        let seen = frame.get_pixel(0, 0).0[0];
        self.journal.push(Event::Inferred {
            model: self.model.clone(),
            value: seen,
        });
        // only the first inference waits; a closed gate lets it through
        if let Some(gate) = self.gate.take() {
            let _ = gate.recv();
        }
        thread::sleep(self.infer_delay);
        let value = match self.answer {
            Answer::Fill(value) => value,
            Answer::Echo => seen,
        };
        Ok(Mask::from_pixel(frame.width(), frame.height(), Luma([value])))
    }

    fn input_size(&self) -> (u32, u32) {
        self.size
    }
}

impl Drop for StubGenerator {
    fn drop(&mut self) {
        self.journal.push(Event::Dropped(self.model.clone()));
    }
}

/// Builds stubs named after the model path; paths containing "missing" fail
pub struct StubFactory {
    pub journal: Journal,
    pub created: AtomicUsize,
    answer: Answer,
    gate: Mutex<Option<Receiver<()>>>,
    create_delay: Duration,
    infer_delay: Duration,
}

impl StubFactory {
    pub fn new(answer: Answer) -> Arc<Self> {
        Self::slow(answer, Duration::ZERO, Duration::ZERO)
    }

    /// Every `create` sleeps `create_delay`, every `infer` sleeps `infer_delay`
    pub fn slow(answer: Answer, create_delay: Duration, infer_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            journal: Journal::default(),
            created: AtomicUsize::new(0),
            answer,
            gate: Mutex::new(None),
            create_delay,
            infer_delay,
        })
    }

    /// The next generator's first `infer` blocks until the returned sender fires
    pub fn gated(answer: Answer) -> (Arc<Self>, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let factory = Arc::new(Self {
            journal: Journal::default(),
            created: AtomicUsize::new(0),
            answer,
            gate: Mutex::new(Some(rx)),
            create_delay: Duration::ZERO,
            infer_delay: Duration::ZERO,
        });
        (factory, tx)
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl MaskGeneratorFactory for StubFactory {
    fn create(&self, spec: &GeneratorSpec) -> Result<Box<dyn MaskGenerator>, GeneratorError> {
        let model = spec.model_path.to_string_lossy().into_owned();
        if model.contains("missing") {
            return Err(GeneratorError::ModelNotFound(spec.model_path.clone()));
        }

        thread::sleep(self.create_delay);
        self.created.fetch_add(1, Ordering::SeqCst);
        self.journal.push(Event::Created(model.clone()));
        Ok(Box::new(StubGenerator {
            model,
            answer: self.answer,
            size: (spec.width, spec.height),
            journal: self.journal.clone(),
            gate: self.gate.lock().unwrap().take(),
            infer_delay: self.infer_delay,
        }))
    }
}

/// Poll `condition` until it holds; panics after five seconds
pub fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}

/// Solid RGB frame whose red channel tags it
pub fn tagged(value: u8, width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, image::Rgb([value, 0, 0]))
}
