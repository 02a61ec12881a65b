use super::preprocess::Preprocessor;
use super::types::{GeneratorSpec, Mask, MaskGenerator, MaskGeneratorFactory};
use crate::debug::DebugSink;
use crate::error::GeneratorError;
use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::fmt::Display;
use std::path::Path;

/// Single-frame portrait segmentation model loaded through ONNX Runtime
///
/// Expects one NCHW float input `[1, 3, H, W]` in [0, 1] and produces the
/// alpha matte as its first output, `[1, 1, H, W]`. Stateless: every frame
/// is segmented on its own.
pub struct OnnxMaskGenerator {
    session: Session,
    preprocessor: Preprocessor,
    width: u32,
    height: u32,
    debug: DebugSink,
}

impl OnnxMaskGenerator {
    /// Load a model and check it runs at the requested resolution
    pub fn new(spec: &GeneratorSpec) -> Result<Self, GeneratorError> {
        let path = spec.model_path.as_path();
        if !path.is_file() {
            return Err(GeneratorError::ModelNotFound(path.to_path_buf()));
        }

        spec.debug
            .emit(&format!("loading model {} ({} threads)", path.display(), spec.threads));

        let session = Session::builder()
            .map_err(|err| load_error(path, err))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|err| load_error(path, err))?
            .with_intra_threads(spec.threads)
            .map_err(|err| load_error(path, err))?
            .commit_from_file(path)
            .map_err(|err| load_error(path, err))?;

        check_input_size(&session, path, spec.width, spec.height)?;

        spec.debug.emit("model loaded");

        Ok(Self {
            session,
            preprocessor: Preprocessor::new(spec.width, spec.height),
            width: spec.width,
            height: spec.height,
            debug: spec.debug.clone(),
        })
    }
}

fn load_error(path: &Path, err: impl Display) -> GeneratorError {
    GeneratorError::Load {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// Models with a fixed input shape must match the filter's target size;
/// symbolic (negative) dimensions accept anything.
fn check_input_size(
    session: &Session,
    path: &Path,
    width: u32,
    height: u32,
) -> Result<(), GeneratorError> {
    let input = session
        .inputs
        .first()
        .ok_or_else(|| load_error(path, "model has no inputs"))?;
    let Some(shape) = input.input_type.tensor_shape() else {
        return Err(load_error(path, "first input is not a tensor"));
    };
    if shape.len() != 4 {
        return Err(load_error(
            path,
            format!("expected a 4-d NCHW input, got {} dimensions", shape.len()),
        ));
    }

    let (expected_height, expected_width) = (shape[2], shape[3]);
    let fixed = expected_width > 0 && expected_height > 0;
    if fixed && (expected_width as u32 != width || expected_height as u32 != height) {
        return Err(GeneratorError::InputSizeMismatch {
            expected_width: expected_width as u32,
            expected_height: expected_height as u32,
            width,
            height,
        });
    }
    Ok(())
}

impl MaskGenerator for OnnxMaskGenerator {
    fn infer(&mut self, frame: &RgbImage) -> Result<Mask, GeneratorError> {
        let _span = tracing::debug_span!("onnx_infer").entered();

        let input = Tensor::from_array(self.preprocessor.preprocess(frame))
            .map_err(|err| GeneratorError::Inference(err.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(|err| GeneratorError::Inference(err.to_string()))?;

        let (shape, matte) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|err| GeneratorError::Inference(err.to_string()))?;
        if shape.len() != 4 {
            self.debug
                .emit(&format!("unexpected matte shape {:?}", &shape[..]));
            return Err(GeneratorError::Inference(format!(
                "expected [1, 1, H, W] matte, got {} dimensions",
                shape.len()
            )));
        }
        let (matte_height, matte_width) = (shape[2] as u32, shape[3] as u32);

        Preprocessor::matte_to_mask(matte, matte_width, matte_height)
    }

    fn input_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Factory used by the filter in production builds
#[derive(Debug, Default, Clone, Copy)]
pub struct OnnxMaskFactory;

impl MaskGeneratorFactory for OnnxMaskFactory {
    fn create(&self, spec: &GeneratorSpec) -> Result<Box<dyn MaskGenerator>, GeneratorError> {
        Ok(Box::new(OnnxMaskGenerator::new(spec)?))
    }
}
