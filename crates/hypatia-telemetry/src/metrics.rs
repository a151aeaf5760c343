//! Prometheus metrics for Hypatia.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `hypatia_requests_total` | Counter | `verb`, `status` | Processed requests |
//! | `hypatia_request_duration_seconds` | Histogram | `verb` | Request latency |
//! | `hypatia_unmatched_requests_total` | Counter | `verb` | Requests no route matched |
//!
//! Recording functions go through the `metrics` facade and are no-ops until
//! a recorder is installed.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Name of the request counter.
pub const REQUESTS_TOTAL: &str = "hypatia_requests_total";
/// Name of the latency histogram.
pub const REQUEST_DURATION_SECONDS: &str = "hypatia_request_duration_seconds";
/// Name of the unmatched request counter.
pub const UNMATCHED_REQUESTS_TOTAL: &str = "hypatia_unmatched_requests_total";

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // 1ms to 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Renders recorded metrics in Prometheus text format.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    handle: PrometheusHandle,
}

impl MetricsRegistry {
    /// Wraps a Prometheus handle.
    #[must_use]
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Renders all metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Builds a Prometheus recorder without installing it.
pub fn build_recorder(config: &MetricsConfig) -> TelemetryResult<PrometheusRecorder> {
    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::InvalidConfig(e.to_string()))?;
    Ok(builder.build_recorder())
}

/// Installs the global Prometheus recorder.
///
/// Returns `None` when metrics are disabled.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<Option<MetricsRegistry>> {
    if !config.enabled {
        return Ok(None);
    }

    let recorder = build_recorder(config)?;
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder).map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    describe_metrics();
    Ok(Some(MetricsRegistry::new(handle)))
}

/// Registers descriptions for the standard metrics.
pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of requests processed");
    describe_histogram!(REQUEST_DURATION_SECONDS, "Request duration in seconds");
    describe_counter!(UNMATCHED_REQUESTS_TOTAL, "Requests that matched no operation");
}

/// Records a completed request.
pub fn record_request(verb: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "verb" => verb.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "verb" => verb.to_string()).record(duration.as_secs_f64());
}

/// Records a request that matched no operation.
pub fn record_unmatched(verb: &str) {
    counter!(UNMATCHED_REQUESTS_TOTAL, "verb" => verb.to_string()).increment(1);
}
