use common::{TelemetryGuard, setup_logging};
use gateway::{AppState, get_configuration};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_configuration()?;

    // The telemetry guard installs its own subscriber
    let _telemetry = match config.otel_endpoint.as_deref() {
        Some(endpoint) => Some(TelemetryGuard::init(
            "gateway",
            endpoint,
            config.log_level,
            config.environment,
        )?),
        None => {
            setup_logging(config.log_level, config.environment);
            None
        }
    };

    tracing::info!(
        environment = config.environment.as_str(),
        static_dir = %config.static_dir.display(),
        max_image_size = config.max_image_size,
        "Loaded configuration"
    );

    let state = AppState::from_config(config);
    gateway::run(state).await
}
