use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_INPUT_SIZE: u32 = 640;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Skip the model entirely and always answer with the mock detection.
    pub mock_mode: bool,
    pub model_path: String,
    /// Square model input edge in pixels.
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub intra_threads: usize,
    /// Comma-separated class names, used when the model carries no `names` metadata.
    pub class_names: Option<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            mock_mode: false,
            model_path: "models/export.onnx".to_string(),
            input_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 100,
            intra_threads: 4,
            class_names: None,
        }
    }
}

impl DetectorConfig {
    /// Weights are configured and present on disk.
    pub fn model_available(&self) -> bool {
        !self.model_path.is_empty() && Path::new(&self.model_path).is_file()
    }

    pub fn class_names(&self) -> Vec<String> {
        self.class_names
            .as_deref()
            .map(|names| {
                names
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Configuration that never touches a model
    pub fn mock() -> Self {
        Self {
            mock_mode: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_class_names_split_and_trimmed() {
        let config = DetectorConfig {
            class_names: Some("healthy, defective,,unknown ".to_string()),
            ..DetectorConfig::default()
        };
        assert_eq!(config.class_names(), vec!["healthy", "defective", "unknown"]);
        assert!(DetectorConfig::default().class_names().is_empty());
    }

    #[test]
    fn test_model_available_requires_existing_file() {
        let missing = DetectorConfig {
            model_path: "/definitely/not/here.onnx".to_string(),
            ..DetectorConfig::default()
        };
        assert!(!missing.model_available());

        let empty = DetectorConfig {
            model_path: String::new(),
            ..DetectorConfig::default()
        };
        assert!(!empty.model_available());

        let weights = NamedTempFile::new().unwrap();
        let present = DetectorConfig {
            model_path: weights.path().to_string_lossy().to_string(),
            ..DetectorConfig::default()
        };
        assert!(present.model_available());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: DetectorConfig =
            serde_json::from_str(r#"{"mock_mode": true, "input_size": 320}"#).unwrap();
        assert!(config.mock_mode);
        assert_eq!(config.input_size, 320);
        assert_eq!(config.model_path, "models/export.onnx");
        assert_eq!(config.max_detections, 100);
    }
}
