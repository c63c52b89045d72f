use super::Detector;
use crate::{
    config::DetectorConfig,
    errors::DetectionFailure,
    processing::{ClassNames, PostProcessor, PreProcessor},
    types::{Detection, DetectionMode},
};
use image::RgbImage;
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use std::sync::Mutex;

struct OrtState {
    session: Session,
    preprocessor: PreProcessor,
}

/// YOLO-family ONNX model served through ONNX Runtime on the CPU.
pub struct RealDetector {
    state: Mutex<OrtState>,
    postprocessor: PostProcessor,
    names: ClassNames,
}

impl RealDetector {
    /// Load the model at `config.model_path`.
    ///
    /// Class names come from the model's `names` metadata when present,
    /// otherwise from `config.class_names`.
    pub fn load(config: &DetectorConfig) -> Result<Self, DetectionFailure> {
        if config.input_size == 0 {
            return Err(DetectionFailure::ModelLoad(
                "input_size must be at least 1".to_string(),
            ));
        }

        if !config.model_available() {
            return Err(DetectionFailure::ModelUnavailable(format!(
                "no model file at '{}'",
                config.model_path
            )));
        }

        let session = build_session(&config.model_path, config.intra_threads)
            .map_err(|e| DetectionFailure::ModelLoad(format!("{:#}", e)))?;

        let names = metadata_names(&session)
            .unwrap_or_else(|| ClassNames::from_list(config.class_names()));

        tracing::info!(
            model = %config.model_path,
            input_size = config.input_size,
            classes = names.len(),
            "ONNX model loaded"
        );

        Ok(Self {
            state: Mutex::new(OrtState {
                session,
                preprocessor: PreProcessor::new((config.input_size, config.input_size)),
            }),
            postprocessor: PostProcessor::new(
                config.confidence_threshold,
                config.iou_threshold,
                config.max_detections,
            ),
            names,
        })
    }

    pub fn class_names(&self) -> &ClassNames {
        &self.names
    }
}

fn build_session(path: &str, intra_threads: usize) -> anyhow::Result<Session> {
    // Initialize ORT environment (idempotent)
    let _ = ort::init().commit();

    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(intra_threads.max(1))?
        .commit_from_file(path)?;

    Ok(session)
}

fn metadata_names(session: &Session) -> Option<ClassNames> {
    let metadata = session.metadata().ok()?;
    let raw = metadata.custom("names").ok().flatten()?;
    let names = ClassNames::parse_metadata(&raw);
    if names.is_none() {
        tracing::warn!(raw = %raw, "Unparseable class names in model metadata");
    }
    names
}

impl Detector for RealDetector {
    fn name(&self) -> &'static str {
        "onnx"
    }

    fn mode(&self) -> DetectionMode {
        DetectionMode::Real
    }

    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, DetectionFailure> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| DetectionFailure::Inference("detector state poisoned".to_string()))?;
        let state = &mut *guard;

        let (input, transform) = state
            .preprocessor
            .preprocess(image)
            .map_err(|e| DetectionFailure::Inference(format!("preprocess: {:#}", e)))?;

        let output = run_session(&mut state.session, &input)
            .map_err(|e| DetectionFailure::Inference(format!("{:#}", e)))?;
        drop(guard);

        let detections =
            self.postprocessor
                .parse_detections(&output.view(), &transform, &self.names);

        tracing::debug!(count = detections.len(), "Model detections");
        Ok(detections)
    }
}

fn run_session(
    session: &mut Session,
    input: &ndarray::Array<f32, ndarray::IxDyn>,
) -> anyhow::Result<ndarray::ArrayD<f32>> {
    let outputs = session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;
    let output = outputs[0].try_extract_array::<f32>()?;
    Ok(output.into_owned())
}
