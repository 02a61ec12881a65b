//! Filter settings, defaults and the property schema exposed to the host.

use crate::debug::DebugSink;
use clap::ValueEnum;
use std::path::{Path, PathBuf};

/// Settings key holding the model path
pub const MODEL_SETTING: &str = "Segmentation model";
/// Model used when the host has no stored setting
pub const MODEL_DEFAULT: &str = "selfie_segmentation.onnx";
/// Inference threads handed to the mask generator
pub const DEFAULT_THREADS: usize = 2;
/// Resolution the mask generator runs at
pub const DEFAULT_TARGET_WIDTH: u32 = 640;
pub const DEFAULT_TARGET_HEIGHT: u32 = 480;

/// How chroma is pulled toward the key colour at background pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ChromaPolicy {
    /// Scale chroma toward the key by the background weight (feathered edges)
    #[default]
    Proportional,
    /// Replace chroma with the key wherever the mask is not fully subject
    Binary,
}

/// YUV value background pixels are keyed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyColor {
    pub luma: u8,
    pub chroma: u8,
}

impl KeyColor {
    /// U = V = 0, a saturated green; luma 0
    pub const GREEN_SCREEN: KeyColor = KeyColor { luma: 0, chroma: 0 };
}

impl Default for KeyColor {
    fn default() -> Self {
        Self::GREEN_SCREEN
    }
}

/// Per-instance options that do not come from host settings
#[derive(Debug, Clone)]
pub struct FilterOptions {
    pub target_width: u32,
    pub target_height: u32,
    pub threads: usize,
    pub chroma_policy: ChromaPolicy,
    pub key: KeyColor,
    /// Directory relative model paths are resolved against
    pub data_dir: Option<PathBuf>,
    pub debug: DebugSink,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            target_width: DEFAULT_TARGET_WIDTH,
            target_height: DEFAULT_TARGET_HEIGHT,
            threads: DEFAULT_THREADS,
            chroma_policy: ChromaPolicy::default(),
            key: KeyColor::default(),
            data_dir: None,
            debug: DebugSink::default(),
        }
    }
}

/// Host-persisted settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub model: String,
}

impl Settings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(MODEL_DEFAULT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    /// A file picker
    FilePath {
        filter: &'static str,
        default: &'static str,
    },
}

/// One user-adjustable property shown by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub key: &'static str,
    pub description: &'static str,
    pub kind: PropertyKind,
}

/// Property schema: a single model file path
pub fn properties() -> Vec<PropertyDescriptor> {
    vec![PropertyDescriptor {
        key: MODEL_SETTING,
        description: "Segmentation model file",
        kind: PropertyKind::FilePath {
            filter: "ONNX models (*.onnx)",
            default: MODEL_DEFAULT,
        },
    }]
}

/// Map a model setting to a path
///
/// Absolute paths are used as given; relative ones are looked up in
/// `data_dir` when one is configured.
pub fn resolve_model_path(model: &str, data_dir: Option<&Path>) -> PathBuf {
    let path = Path::new(model);
    match data_dir {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}
