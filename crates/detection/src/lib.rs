pub mod adapter;
pub mod backend;
pub mod config;
pub mod errors;
pub mod overlay;
pub mod processing;
pub mod types;

// Re-export commonly used types for convenience
pub use adapter::{DetectionAdapter, load_image};
pub use backend::{Detector, MockDetector};
pub use config::DetectorConfig;
pub use errors::DetectionFailure;
pub use types::{Detection, DetectionMode, DetectionResult};
