//! Configuration schema types.
//!
//! Every section rejects unknown fields and falls back to defaults for
//! missing ones.

use hypatia_telemetry::{LogConfig, LogFormat, MetricsConfig, TelemetryConfig};
use serde::{Deserialize, Serialize};

/// Routing configuration section.
///
/// # Example
///
/// ```
/// use hypatia_config::RoutingConfig;
///
/// let config = RoutingConfig::default();
/// assert_eq!(config.api_prefix, "api");
/// assert_eq!(config.url_parsers, ["http", "ftp", "urn"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Prefix of conventional controller routes (`/<prefix>/<name>`).
    /// Empty puts controllers at the root.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Built-in URL parsers to register (`http`, `ftp`, `urn`).
    #[serde(default = "default_url_parsers")]
    pub url_parsers: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_prefix: default_api_prefix(),
            url_parsers: default_url_parsers(),
        }
    }
}

fn default_api_prefix() -> String {
    "api".to_string()
}

fn default_url_parsers() -> Vec<String> {
    vec!["http".to_string(), "ftp".to_string(), "urn".to_string()]
}

/// Converter configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConvertersConfig {
    /// Built-in converters to register (`json`, `text`), in order.
    #[serde(default = "default_converters")]
    pub enabled: Vec<String>,
}

impl Default for ConvertersConfig {
    fn default() -> Self {
        Self {
            enabled: default_converters(),
        }
    }
}

fn default_converters() -> Vec<String> {
    vec!["json".to_string(), "text".to_string()]
}

/// Argument binding limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BindingConfig {
    /// Largest accepted request body; larger bodies fail with 413.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Largest accepted number of multipart parts.
    #[serde(default = "default_max_multipart_fields")]
    pub max_multipart_fields: usize,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
            max_multipart_fields: default_max_multipart_fields(),
        }
    }
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_max_multipart_fields() -> usize {
    100
}

/// Error rendering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ErrorsConfig {
    /// Show internal error messages in error envelopes.
    #[serde(default)]
    pub expose_internal: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log filter directive (e.g. `info` or `hypatia_router=debug,info`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Install the Prometheus recorder.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Histogram bucket boundaries for request duration, in seconds.
    #[serde(default = "default_histogram_buckets")]
    pub histogram_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            histogram_buckets: default_histogram_buckets(),
        }
    }
}

fn default_histogram_buckets() -> Vec<f64> {
    MetricsConfig::default().duration_buckets
}

/// Telemetry configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfigSection {
    /// Service name recorded in logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for TelemetryConfigSection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            logging: LoggingConfig::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl TelemetryConfigSection {
    /// Converts this section into the settings `hypatia-telemetry` installs.
    #[must_use]
    pub fn to_telemetry_config(&self) -> TelemetryConfig {
        let development = self.logging.format == LogFormat::Pretty;
        TelemetryConfig {
            logging: LogConfig {
                enabled: self.logging.enabled,
                level: self.logging.level.clone(),
                format: self.logging.format,
                span_events: development,
                file_line_info: development,
                service_name: self.service_name.clone(),
            },
            metrics: MetricsConfig {
                enabled: self.metrics.enabled,
                duration_buckets: self.metrics.histogram_buckets.clone(),
            },
        }
    }
}

fn default_service_name() -> String {
    "hypatia-service".to_string()
}

fn default_true() -> bool {
    true
}
