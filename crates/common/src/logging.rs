use crate::config::{Environment, LogLevel};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
};

/// Install the global subscriber for a service running without an OTLP collector.
///
/// `RUST_LOG` takes precedence; otherwise `log_level` is used as the filter.
/// Development gets pretty output, production gets JSON lines.
pub fn setup_logging(log_level: LogLevel, environment: Environment) {
    // Spans still carry OpenTelemetry context for any later exporter
    install_subscriber(log_level, environment, tracing_opentelemetry::layer());
}

pub(crate) fn env_filter(log_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.as_str()))
}

/// Filter, `extra` layer and the environment's formatter, installed globally.
pub(crate) fn install_subscriber<L>(log_level: LogLevel, environment: Environment, extra: L)
where
    L: Layer<Layered<EnvFilter, Registry>> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(extra);

    match environment {
        Environment::Production => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_level(true))
                .init();
        }
        Environment::Development => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_ansi(true))
                .init();
        }
    }
}
