use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One recognized object instance in pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f64,
    /// `[x1, y1, x2, y2]`
    pub bbox: [u32; 4],
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f64, bbox: [u32; 4]) -> Self {
        Self {
            label: label.into(),
            confidence: round_confidence(confidence),
            bbox,
        }
    }
}

/// Where a set of detections came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    Real,
    Mock,
}

impl DetectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMode::Real => "real",
            DetectionMode::Mock => "mock",
        }
    }
}

/// Normalized output of a single detection call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
    pub width: u32,
    pub height: u32,
    pub mode: DetectionMode,
    #[serde(skip)]
    pub overlay: Option<RgbaImage>,
    /// Set only once the overlay has been written to disk.
    #[serde(skip)]
    pub overlay_path: Option<PathBuf>,
}

impl DetectionResult {
    pub fn new(detections: Vec<Detection>, width: u32, height: u32, mode: DetectionMode) -> Self {
        Self {
            detections,
            width,
            height,
            mode,
            overlay: None,
            overlay_path: None,
        }
    }
}

/// Round to 4 decimal places and clamp into [0, 1].
///
/// Non-finite scores collapse to 0.
pub fn round_confidence(confidence: f64) -> f64 {
    if !confidence.is_finite() {
        return 0.0;
    }
    ((confidence * 10_000.0).round() / 10_000.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_confidence_four_decimals() {
        assert_eq!(round_confidence(0.123456), 0.1235);
        assert_eq!(round_confidence(0.97), 0.97);
        assert_eq!(round_confidence(0.99996), 1.0);
        assert_eq!(round_confidence(0.00004), 0.0);
    }

    #[test]
    fn test_round_confidence_clamps_out_of_range() {
        assert_eq!(round_confidence(1.7), 1.0);
        assert_eq!(round_confidence(-0.2), 0.0);
        assert_eq!(round_confidence(f64::NAN), 0.0);
        assert_eq!(round_confidence(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_detection_serializes_canonical_contract() {
        let detection = Detection::new("healthy_crop", 0.97, [6, 6, 57, 57]);
        let json = serde_json::to_value(&detection).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "label": "healthy_crop",
                "confidence": 0.97,
                "bbox": [6, 6, 57, 57]
            })
        );
    }

    #[test]
    fn test_result_skips_overlay_fields() {
        let mut result = DetectionResult::new(Vec::new(), 10, 20, DetectionMode::Mock);
        result.overlay_path = Some(PathBuf::from("/tmp/overlay.png"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "detections": [],
                "width": 10,
                "height": 20,
                "mode": "mock"
            })
        );
    }
}
