//! The top-level [`HypatiaConfig`] and its builder.

use std::collections::HashSet;

use hypatia_core::converter_by_name;
use hypatia_telemetry::logging::create_env_filter;
use hypatia_telemetry::LogFormat;
use hypatia_url::UrlParserRegistry;
use serde::{Deserialize, Serialize};

use crate::{
    BindingConfig, ConfigError, ConvertersConfig, ErrorsConfig, RoutingConfig,
    TelemetryConfigSection,
};

/// Complete Hypatia configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use hypatia_config::HypatiaConfig;
///
/// let config = HypatiaConfig::default();
/// assert_eq!(config.routing.api_prefix, "api");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct HypatiaConfig {
    /// Route conventions and URL parsers.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Body converters.
    #[serde(default)]
    pub converters: ConvertersConfig,

    /// Binding limits.
    #[serde(default)]
    pub binding: BindingConfig,

    /// Error rendering.
    #[serde(default)]
    pub errors: ErrorsConfig,

    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetryConfigSection,
}

impl HypatiaConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use hypatia_config::{BindingConfig, HypatiaConfig};
    ///
    /// let config = HypatiaConfig::builder()
    ///     .binding(BindingConfig {
    ///         max_body_bytes: 4096,
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert_eq!(config.binding.max_body_bytes, 4096);
    /// ```
    #[must_use]
    pub fn builder() -> HypatiaConfigBuilder {
        HypatiaConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `routing.api_prefix` contains characters outside unreserved URL
    ///   characters and `/`, or empty segments
    /// - a URL parser or converter name is unknown, or a list is empty
    /// - a binding limit is zero
    /// - the log level is not a valid filter directive
    /// - histogram buckets are empty or not increasing
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_prefix(&self.routing.api_prefix)?;

        if self.routing.url_parsers.is_empty() {
            return Err(ConfigError::invalid_value(
                "routing.url_parsers",
                "at least one URL parser is required",
            ));
        }
        warn_duplicates("routing.url_parsers", &self.routing.url_parsers);
        UrlParserRegistry::from_names(&self.routing.url_parsers)
            .map_err(|e| ConfigError::invalid_value("routing.url_parsers", e.to_string()))?;

        if self.converters.enabled.is_empty() {
            return Err(ConfigError::invalid_value(
                "converters.enabled",
                "at least one converter is required",
            ));
        }
        warn_duplicates("converters.enabled", &self.converters.enabled);
        for name in &self.converters.enabled {
            converter_by_name(name)
                .map_err(|e| ConfigError::invalid_value("converters.enabled", e.to_string()))?;
        }

        if self.binding.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "binding.max_body_bytes",
                "must be greater than zero",
            ));
        }
        if self.binding.max_multipart_fields == 0 {
            return Err(ConfigError::invalid_value(
                "binding.max_multipart_fields",
                "must be greater than zero",
            ));
        }

        if self.telemetry.logging.enabled {
            create_env_filter(&self.telemetry.logging.level).map_err(|e| {
                ConfigError::invalid_value("telemetry.logging.level", e.to_string())
            })?;
        }

        let buckets = &self.telemetry.metrics.histogram_buckets;
        if self.telemetry.metrics.enabled
            && (buckets.is_empty() || buckets.windows(2).any(|pair| pair[0] >= pair[1]))
        {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.histogram_buckets",
                "must be a non-empty, strictly increasing list",
            ));
        }

        if self.errors.expose_internal {
            tracing::warn!("internal error messages are exposed in responses");
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty, debug level logs
    /// - Internal error messages in responses
    ///
    /// # Example
    ///
    /// ```
    /// use hypatia_config::HypatiaConfig;
    ///
    /// let config = HypatiaConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// assert!(config.errors.expose_internal);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.errors.expose_internal = true;
        config
    }

    /// Create a production configuration preset: JSON logs at `info`,
    /// internal error messages hidden.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.errors.expose_internal = false;
        config
    }
}

fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(());
    }
    if let Some(bad) = trimmed
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '/')))
    {
        return Err(ConfigError::invalid_value(
            "routing.api_prefix",
            format!("invalid character {bad:?} in '{prefix}'"),
        ));
    }
    if trimmed.split('/').any(str::is_empty) {
        return Err(ConfigError::invalid_value(
            "routing.api_prefix",
            format!("empty path segment in '{prefix}'"),
        ));
    }
    Ok(())
}

fn warn_duplicates(field: &str, names: &[String]) {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.to_ascii_lowercase()) {
            tracing::warn!(field, name = name.as_str(), "duplicate entry ignored");
        }
    }
}

/// Builder for [`HypatiaConfig`].
#[derive(Debug, Default)]
pub struct HypatiaConfigBuilder {
    config: HypatiaConfig,
}

impl HypatiaConfigBuilder {
    /// Create a builder starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the routing section.
    #[must_use]
    pub fn routing(mut self, routing: RoutingConfig) -> Self {
        self.config.routing = routing;
        self
    }

    /// Set the converters section.
    #[must_use]
    pub fn converters(mut self, converters: ConvertersConfig) -> Self {
        self.config.converters = converters;
        self
    }

    /// Set the binding section.
    #[must_use]
    pub fn binding(mut self, binding: BindingConfig) -> Self {
        self.config.binding = binding;
        self
    }

    /// Set the errors section.
    #[must_use]
    pub fn errors(mut self, errors: ErrorsConfig) -> Self {
        self.config.errors = errors;
        self
    }

    /// Set the telemetry section.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetryConfigSection) -> Self {
        self.config.telemetry = telemetry;
        self
    }

    /// Build the configuration without validating it.
    #[must_use]
    pub fn build(self) -> HypatiaConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(HypatiaConfig::default().validate().is_ok());
        assert!(HypatiaConfig::development().validate().is_ok());
        assert!(HypatiaConfig::production().validate().is_ok());
    }

    #[test]
    fn test_prefix_validation() {
        for ok in ["", "api", "/api/", "api/v2", "v1.0", "my-api"] {
            assert!(validate_prefix(ok).is_ok(), "{ok}");
        }
        for bad in ["api?x", "a b", "api//v2", "caf\u{e9}"] {
            assert!(validate_prefix(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_unknown_url_parser_rejected() {
        let mut config = HypatiaConfig::default();
        config.routing.url_parsers.push("gopher".to_string());

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("routing.url_parsers"));
        assert!(err.to_string().contains("gopher"));
    }

    #[test]
    fn test_empty_lists_rejected() {
        let mut config = HypatiaConfig::default();
        config.routing.url_parsers.clear();
        assert!(config.validate().is_err());

        let mut config = HypatiaConfig::default();
        config.converters.enabled.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_converter_rejected() {
        let config = HypatiaConfig::builder()
            .converters(ConvertersConfig {
                enabled: vec!["json".to_string(), "xml".to_string()],
            })
            .build();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("converters.enabled"));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = HypatiaConfig::default();
        config.binding.max_body_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = HypatiaConfig::default();
        config.binding.max_multipart_fields = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = HypatiaConfig::default();
        config.telemetry.logging.level = "hypatia=loudest".to_string();
        assert!(config.validate().is_err());

        config.telemetry.logging.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unsorted_buckets_rejected() {
        let mut config = HypatiaConfig::default();
        config.telemetry.metrics.histogram_buckets = vec![1.0, 0.5];
        assert!(config.validate().is_err());
    }
}
