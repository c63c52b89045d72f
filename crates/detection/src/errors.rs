use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionFailure {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to render overlay: {0}")]
    Overlay(String),
}

impl DetectionFailure {
    /// Failures that the mock detector can stand in for.
    ///
    /// Input errors are not recoverable: the mock still needs the image dimensions.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DetectionFailure::ModelUnavailable(_)
                | DetectionFailure::ModelLoad(_)
                | DetectionFailure::Inference(_)
        )
    }
}
