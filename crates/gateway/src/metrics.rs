use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};

/// Instruments recorded by the analyze endpoint.
///
/// Backed by the global meter provider, which is a no-op until telemetry is initialized.
#[derive(Clone)]
pub struct Metrics {
    requests: Counter<u64>,
    duration: Histogram<f64>,
}

impl Metrics {
    pub fn init(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ];

        let duration: Histogram<f64> = meter
            .f64_histogram("analyze_duration_seconds")
            .with_description("Time to analyze one uploaded image (upload + detection + overlay)")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build();
        let requests: Counter<u64> = meter
            .u64_counter("analyze_requests_total")
            .with_description("Total successful analyze requests by detection mode")
            .build();

        Self { requests, duration }
    }

    pub fn record_analysis(&self, mode: &'static str, elapsed_secs: f64) {
        let attributes = [KeyValue::new("mode", mode)];
        self.requests.add(1, &attributes);
        self.duration.record(elapsed_secs, &attributes);
    }
}
