use crate::{
    errors::DetectionFailure,
    types::{Detection, DetectionMode},
};
use image::RgbImage;

pub mod mock;

#[cfg(feature = "ort-backend")]
pub mod ort;

pub use mock::MockDetector;

#[cfg(feature = "ort-backend")]
pub use self::ort::RealDetector;

/// Capability interface over object detectors.
///
/// Implementations are selected once at startup and shared across requests,
/// so `detect` takes `&self`.
pub trait Detector: Send + Sync {
    /// Short name for logs and health output
    fn name(&self) -> &'static str;

    fn mode(&self) -> DetectionMode;

    /// Detections in source-image pixel space, in model output order.
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, DetectionFailure>;
}
