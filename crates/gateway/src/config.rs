use common::{Environment, LogLevel};
use detection::DetectorConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Maximum number of analyses kept for report generation
    pub capacity: usize,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub log_level: LogLevel,
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub max_image_size: usize,
    /// Comma-separated, case-insensitive, without the leading dot
    pub allowed_extensions: String,
    /// Comma-separated origins, `*` for any
    pub cors_origins: String,
    pub otel_endpoint: Option<String>,
    pub store: StoreConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
}

impl Config {
    pub fn allowed_extensions(&self) -> Vec<String> {
        split_list(&self.allowed_extensions)
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect()
    }

    pub fn is_allowed_extension(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.allowed_extensions().iter().any(|e| *e == extension)
    }

    pub fn cors_origins(&self) -> Vec<String> {
        split_list(&self.cors_origins).map(str::to_string).collect()
    }

    pub fn overlay_dir(&self) -> PathBuf {
        self.static_dir.join("overlays")
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

pub fn get_configuration() -> Result<Config, config::ConfigError> {
    get_configuration_from(None)
}

/// Same as [`get_configuration`], reading `GATEWAY_*` overrides from `vars`
/// instead of the process environment when given.
pub fn get_configuration_from(
    vars: Option<HashMap<String, String>>,
) -> Result<Config, config::ConfigError> {
    let environment = config::Environment::with_prefix("GATEWAY")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(vars);

    let config = config::Config::builder()
        .set_default("log_level", "info")?
        .set_default("environment", "development")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8000)?
        .set_default("static_dir", "static")?
        .set_default("upload_dir", "uploads")?
        .set_default("max_image_size", DEFAULT_MAX_IMAGE_SIZE as u64)?
        .set_default("allowed_extensions", "jpg,jpeg,png,bmp,webp")?
        .set_default("cors_origins", "*")?
        .set_default("store.capacity", 256)?
        .set_default("store.ttl_secs", 3600)?
        .add_source(environment)
        .build()?;

    config.try_deserialize::<Config>()
}
