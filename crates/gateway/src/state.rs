use crate::{config::Config, metrics::Metrics, store::AnalysisStore};
use detection::DetectionAdapter;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub adapter: Arc<DetectionAdapter>,
    pub store: Arc<AnalysisStore>,
    pub metrics: Metrics,
}

impl AppState {
    /// Build state around an already selected adapter.
    pub fn new(config: Config, adapter: DetectionAdapter) -> Self {
        let store = AnalysisStore::new(
            config.store.capacity,
            Duration::from_secs(config.store.ttl_secs),
        );

        Self {
            config: Arc::new(config),
            adapter: Arc::new(adapter),
            store: Arc::new(store),
            metrics: Metrics::init("gateway"),
        }
    }

    /// Select the detector from configuration. Falls back to mock, never fails.
    pub fn from_config(config: Config) -> Self {
        let adapter = DetectionAdapter::from_config(&config.detector);
        Self::new(config, adapter)
    }
}
