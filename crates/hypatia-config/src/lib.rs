//! Typed configuration for Hypatia.
//!
//! This crate provides a strongly-typed configuration system with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! [`HypatiaConfig`] holds every section:
//!
//! - [`RoutingConfig`] - API prefix and URL parsers
//! - [`ConvertersConfig`] - body converters
//! - [`BindingConfig`] - body and multipart limits
//! - [`ErrorsConfig`] - error rendering
//! - [`TelemetryConfigSection`] - logging and metrics
//!
//! # Example
//!
//! ```no_run
//! use hypatia_config::ConfigLoader;
//!
//! # fn main() -> Result<(), hypatia_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_optional_file("hypatia.toml")?
//!     .with_env_prefix("HYPATIA")
//!     .load()?;
//!
//! println!("controllers live under /{}", config.routing.api_prefix);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [routing]
//! api_prefix = "api"
//! url_parsers = ["http", "ftp", "urn"]
//!
//! [converters]
//! enabled = ["json", "text"]
//!
//! [binding]
//! max_body_bytes = 1048576
//! max_multipart_fields = 100
//!
//! [errors]
//! expose_internal = false
//!
//! [telemetry]
//! service_name = "people-service"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `HYPATIA_ROUTING__API_PREFIX=v2`
//! - `HYPATIA_BINDING__MAX_BODY_BYTES=65536`
//! - `HYPATIA_TELEMETRY__LOGGING__LEVEL=debug`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{HypatiaConfig, HypatiaConfigBuilder};
pub use error::ConfigError;
pub use hypatia_telemetry::LogFormat;
pub use loader::ConfigLoader;
pub use schema::{
    BindingConfig, ConvertersConfig, ErrorsConfig, LoggingConfig, MetricsSection, RoutingConfig,
    TelemetryConfigSection,
};
