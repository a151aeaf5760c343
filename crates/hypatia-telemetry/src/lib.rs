//! Observability for Hypatia services.
//!
//! - **Logging**: a `tracing-subscriber` registry with an `EnvFilter` and
//!   JSON or pretty output
//! - **Metrics**: request counters and latency histograms through the
//!   `metrics` facade, rendered by a Prometheus recorder
//!
//! The request pipeline calls [`metrics::record_request`] and
//! [`metrics::record_unmatched`]; without an installed recorder these do
//! nothing.
//!
//! # Example
//!
//! ```rust,ignore
//! use hypatia_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let registry = init_telemetry(&TelemetryConfig::default())?;
//! if let Some(registry) = registry {
//!     println!("{}", registry.render());
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/hypatia-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{init_metrics, MetricsConfig, MetricsRegistry};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Configuration for all telemetry subsystems.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TelemetryConfig {
    /// Logging configuration.
    pub logging: LogConfig,
    /// Metrics configuration.
    pub metrics: MetricsConfig,
}

/// Installs logging, then metrics.
///
/// Returns the metrics registry when metrics are enabled.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<Option<MetricsRegistry>> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)
}
