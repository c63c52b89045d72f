use super::Detector;
use crate::{
    errors::DetectionFailure,
    types::{Detection, DetectionMode},
};
use image::RgbImage;

pub const MOCK_LABEL: &str = "healthy_crop";
pub const MOCK_CONFIDENCE: f64 = 0.97;

/// Start and end of the mock box as fractions of each axis.
const MOCK_START: f64 = 0.1;
const MOCK_END: f64 = 0.9;

/// Deterministic stand-in used when no model can run.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockDetector;

impl MockDetector {
    pub fn new() -> Self {
        Self
    }

    /// The single placeholder detection covering the central 80% of the image.
    pub fn detection_for(width: u32, height: u32) -> Detection {
        let w = width as f64;
        let h = height as f64;
        let bbox = [
            (MOCK_START * w) as u32,
            (MOCK_START * h) as u32,
            (MOCK_END * w) as u32,
            (MOCK_END * h) as u32,
        ];
        Detection::new(MOCK_LABEL, MOCK_CONFIDENCE, bbox)
    }
}

impl Detector for MockDetector {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn mode(&self) -> DetectionMode {
        DetectionMode::Mock
    }

    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, DetectionFailure> {
        Ok(vec![Self::detection_for(image.width(), image.height())])
    }
}
