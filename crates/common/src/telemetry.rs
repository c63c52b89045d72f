use crate::{Environment, LogLevel, logging::install_subscriber};
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    metrics::{PeriodicReader, SdkMeterProvider},
    propagation::TraceContextPropagator,
    trace::{Sampler, SdkTracerProvider},
};
use opentelemetry_semantic_conventions::attribute::{SERVICE_NAME, SERVICE_VERSION};
use std::time::Duration;

const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(10);

/// Where and how a service exports traces and metrics.
#[derive(Debug, Clone)]
pub struct TelemetrySettings<'a> {
    pub service_name: &'a str,
    /// OTLP gRPC collector, e.g. `http://localhost:4317`
    pub endpoint: &'a str,
    pub log_level: LogLevel,
    pub environment: Environment,
    pub metrics_interval: Duration,
}

impl<'a> TelemetrySettings<'a> {
    pub fn new(
        service_name: &'a str,
        endpoint: &'a str,
        log_level: LogLevel,
        environment: Environment,
    ) -> Self {
        Self {
            service_name,
            endpoint,
            log_level,
            environment,
            metrics_interval: DEFAULT_METRICS_INTERVAL,
        }
    }
}

/// Owns the OTLP tracer and meter providers; flushes and shuts them down on drop.
///
/// Installing the guard also installs the global `tracing` subscriber, so
/// `setup_logging` must not be called as well.
///
/// # Example
/// ```ignore
/// let _telemetry = TelemetryGuard::init(
///     "gateway",
///     "http://localhost:4317",
///     LogLevel::Info,
///     Environment::Production,
/// )?;
/// ```
pub struct TelemetryGuard {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl TelemetryGuard {
    pub fn init(
        service_name: &str,
        endpoint: &str,
        log_level: LogLevel,
        environment: Environment,
    ) -> anyhow::Result<Self> {
        Self::init_with(&TelemetrySettings::new(
            service_name,
            endpoint,
            log_level,
            environment,
        ))
    }

    pub fn init_with(settings: &TelemetrySettings<'_>) -> anyhow::Result<Self> {
        global::set_text_map_propagator(TraceContextPropagator::new());

        let resource = service_resource(settings.service_name);
        let tracer_provider = tracer_provider(settings.endpoint, resource.clone())?;
        let meter_provider =
            meter_provider(settings.endpoint, resource, settings.metrics_interval)?;

        global::set_tracer_provider(tracer_provider.clone());
        global::set_meter_provider(meter_provider.clone());

        let otel_layer = tracing_opentelemetry::layer()
            .with_tracer(global::tracer(settings.service_name.to_string()));
        install_subscriber(settings.log_level, settings.environment, otel_layer);

        tracing::info!(
            service = settings.service_name,
            endpoint = settings.endpoint,
            "Telemetry export enabled"
        );

        Ok(Self {
            tracer_provider,
            meter_provider,
        })
    }
}

fn service_resource(service_name: &str) -> Resource {
    Resource::builder()
        .with_attributes([
            KeyValue::new(SERVICE_NAME, service_name.to_string()),
            KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        ])
        .build()
}

fn tracer_provider(endpoint: &str, resource: Resource) -> anyhow::Result<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
        .with_batch_exporter(exporter)
        .build())
}

fn meter_provider(
    endpoint: &str,
    resource: Resource,
    interval: Duration,
) -> anyhow::Result<SdkMeterProvider> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(interval)
        .build();

    Ok(SdkMeterProvider::builder()
        .with_resource(resource)
        .with_reader(reader)
        .build())
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Err(e) = self.tracer_provider.shutdown() {
            eprintln!("Failed to shutdown tracer provider: {:?}", e);
        }
        if let Err(e) = self.meter_provider.shutdown() {
            eprintln!("Failed to shutdown meter provider: {:?}", e);
        }
    }
}

/// Creates an info-level span and enters it.
#[macro_export]
macro_rules! span {
    ($name:literal) => {
        tracing::info_span!($name).entered()
    };
}

/// Creates a debug-level span and enters it.
#[macro_export]
macro_rules! span_debug {
    ($name:literal) => {
        tracing::debug_span!($name).entered()
    };
}
