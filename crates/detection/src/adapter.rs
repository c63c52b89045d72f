use crate::{
    backend::{Detector, MockDetector},
    config::DetectorConfig,
    errors::DetectionFailure,
    overlay::{render_overlay, save_overlay},
    types::{Detection, DetectionMode, DetectionResult},
};
use image::DynamicImage;
use std::path::Path;

/// Front door for detection: a detector chosen once at startup, with the mock
/// detector standing by for recoverable failures.
pub struct DetectionAdapter {
    detector: Box<dyn Detector>,
    fallback: MockDetector,
}

impl DetectionAdapter {
    pub fn new(detector: Box<dyn Detector>) -> Self {
        Self {
            detector,
            fallback: MockDetector,
        }
    }

    pub fn mock() -> Self {
        Self::new(Box::new(MockDetector))
    }

    /// Pick the detector for the lifetime of the process.
    ///
    /// Never fails: any reason the model cannot be used degrades to mock.
    pub fn from_config(config: &DetectorConfig) -> Self {
        if config.mock_mode {
            tracing::info!("Mock mode enabled, model will not be loaded");
            return Self::mock();
        }

        match load_real_detector(config) {
            Ok(detector) => {
                tracing::info!(detector = detector.name(), "Using model detector");
                Self::new(detector)
            }
            Err(DetectionFailure::ModelUnavailable(reason)) => {
                tracing::info!(reason = %reason, "Model unavailable, using mock detector");
                Self::mock()
            }
            Err(e) => {
                tracing::error!(error = %e, "Model failed to load, using mock detector");
                Self::mock()
            }
        }
    }

    pub fn detector_name(&self) -> &'static str {
        self.detector.name()
    }

    pub fn mode(&self) -> DetectionMode {
        self.detector.mode()
    }

    /// Detect objects in the image at `image_path`.
    ///
    /// Recoverable detector failures are logged and answered with the mock
    /// result. Only input errors reach the caller.
    #[tracing::instrument(skip(self), fields(detector = self.detector.name()))]
    pub fn detect(
        &self,
        image_path: &Path,
        overlay_path: Option<&Path>,
    ) -> Result<DetectionResult, DetectionFailure> {
        self.run(image_path, overlay_path, true)
    }

    /// Same as [`detect`](Self::detect) without the mock fallback.
    #[tracing::instrument(skip(self), fields(detector = self.detector.name()))]
    pub fn detect_strict(
        &self,
        image_path: &Path,
        overlay_path: Option<&Path>,
    ) -> Result<DetectionResult, DetectionFailure> {
        self.run(image_path, overlay_path, false)
    }

    fn run(
        &self,
        image_path: &Path,
        overlay_path: Option<&Path>,
        allow_fallback: bool,
    ) -> Result<DetectionResult, DetectionFailure> {
        let image = load_image(image_path)?;
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let (detections, mode) = match self.detector.detect(&rgb) {
            Ok(detections) => (detections, self.detector.mode()),
            Err(e) if allow_fallback && e.is_recoverable() => {
                tracing::warn!(error = %e, "Detection failed, falling back to mock");
                (self.mock_detections(width, height), DetectionMode::Mock)
            }
            Err(e) => return Err(e),
        };

        tracing::debug!(count = detections.len(), mode = mode.as_str(), "Detection complete");

        let mut result = DetectionResult::new(detections, width, height, mode);

        if let Some(path) = overlay_path {
            let overlay = render_overlay(&image.to_rgba8(), &result.detections);
            match save_overlay(&overlay, path) {
                Ok(()) => result.overlay_path = Some(path.to_path_buf()),
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "Overlay not written");
                }
            }
            result.overlay = Some(overlay);
        }

        Ok(result)
    }

    fn mock_detections(&self, width: u32, height: u32) -> Vec<Detection> {
        vec![MockDetector::detection_for(width, height)]
    }
}

impl Default for DetectionAdapter {
    fn default() -> Self {
        Self::mock()
    }
}

#[cfg(feature = "ort-backend")]
fn load_real_detector(config: &DetectorConfig) -> Result<Box<dyn Detector>, DetectionFailure> {
    let detector = crate::backend::RealDetector::load(config)?;
    Ok(Box::new(detector))
}

#[cfg(not(feature = "ort-backend"))]
fn load_real_detector(_config: &DetectorConfig) -> Result<Box<dyn Detector>, DetectionFailure> {
    Err(DetectionFailure::ModelUnavailable(
        "built without the ort-backend feature".to_string(),
    ))
}

/// Read and decode an image file.
///
/// A missing or unreadable file is `Io`, undecodable content is `ImageDecode`.
pub fn load_image(path: &Path) -> Result<DynamicImage, DetectionFailure> {
    let bytes = std::fs::read(path)?;
    Ok(image::load_from_memory(&bytes)?)
}
