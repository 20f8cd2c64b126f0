use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram, Meter, UpDownCounter};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::sync::Arc;

use http::Method;

pub mod labels {
    pub const METHOD: &str = "method";
    pub const STATUS_CODE: &str = "status_code";
    pub const SCOPE: &str = "scope";
}

#[derive(Clone)]
pub struct Metrics {
    pub connections_total: Counter<u64>,
    pub connections_active: UpDownCounter<i64>,

    pub requests_total: Counter<u64>,
    pub requests_duration_seconds: Histogram<f64>,

    // Admission control metrics
    pub admission_allowed_total: Counter<u64>,
    pub admission_rejected_total: Counter<u64>,
    pub identity_errors_total: Counter<u64>,
}

impl Metrics {
    fn new(meter: Meter) -> Self {
        Self {
            connections_total: meter
                .u64_counter("munin_connections_total")
                .with_description("Total number of connections accepted")
                .build(),
            connections_active: meter
                .i64_up_down_counter("munin_connections_active")
                .with_description("Number of active connections")
                .build(),

            requests_total: meter
                .u64_counter("munin_requests_total")
                .with_description("Total number of HTTP requests received")
                .build(),
            requests_duration_seconds: meter
                .f64_histogram("munin_requests_duration_seconds")
                .with_description("HTTP request handling duration in seconds")
                .build(),

            admission_allowed_total: meter
                .u64_counter("munin_admission_allowed_total")
                .with_description("Requests admitted by the rate limiter")
                .build(),
            admission_rejected_total: meter
                .u64_counter("munin_admission_rejected_total")
                .with_description("Requests rejected by the rate limiter")
                .build(),
            identity_errors_total: meter
                .u64_counter("munin_identity_errors_total")
                .with_description("Requests whose client identity could not be derived")
                .build(),
        }
    }

    pub fn record_connection_opened(&self) {
        self.connections_total.add(1, &[]);
        self.connections_active.add(1, &[]);
    }

    pub fn record_connection_closed(&self) {
        self.connections_active.add(-1, &[]);
    }

    pub fn record_request(&self, method: &Method) {
        self.requests_total
            .add(1, &[KeyValue::new(labels::METHOD, method.to_string())]);
    }

    pub fn record_request_complete(&self, method: &Method, status_code: u16, seconds: f64) {
        self.requests_duration_seconds.record(
            seconds,
            &[
                KeyValue::new(labels::METHOD, method.to_string()),
                KeyValue::new(labels::STATUS_CODE, status_code.to_string()),
            ],
        );
    }

    pub fn record_admission_allowed(&self, scope: &'static str) {
        self.admission_allowed_total
            .add(1, &[KeyValue::new(labels::SCOPE, scope)]);
    }

    pub fn record_admission_rejected(&self, scope: &'static str) {
        self.admission_rejected_total
            .add(1, &[KeyValue::new(labels::SCOPE, scope)]);
    }

    pub fn record_identity_error(&self) {
        self.identity_errors_total.add(1, &[]);
    }
}

pub fn init_metrics() -> Result<(Arc<Metrics>, Registry), Box<dyn std::error::Error + Send + Sync>>
{
    let registry = Registry::default();

    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()?;

    let meter_provider = SdkMeterProvider::builder().with_reader(exporter).build();

    global::set_meter_provider(meter_provider);

    let meter = global::meter("munin-api");
    let metrics = Arc::new(Metrics::new(meter));

    Ok((metrics, registry))
}
