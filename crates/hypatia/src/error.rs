//! Application assembly errors.

use hypatia_config::ConfigError;
use hypatia_core::ConverterError;
use hypatia_router::DescriptionError;
use hypatia_telemetry::TelemetryError;
use hypatia_url::UrlError;
use thiserror::Error;

/// Failure while assembling or starting an [`Application`](crate::Application).
///
/// All of these are startup errors; a running application never returns
/// them for a request.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// The configuration did not validate.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A URL parser could not be registered.
    #[error(transparent)]
    Url(#[from] UrlError),

    /// A converter could not be resolved or installed.
    #[error(transparent)]
    Converter(#[from] ConverterError),

    /// A controller's metadata could not be described.
    #[error("controller description failed: {0}")]
    Description(#[from] DescriptionError),

    /// Logging or metrics could not be installed.
    #[error("telemetry initialization failed: {0}")]
    Telemetry(#[from] TelemetryError),

    /// A controller was registered without a factory and no custom
    /// activator was supplied.
    #[error("no factory registered for controller '{0}'")]
    MissingFactory(String),

    /// The same controller type was registered twice.
    #[error("controller '{0}' registered twice")]
    DuplicateController(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApplicationError::MissingFactory("PersonController".to_string());
        assert_eq!(err.to_string(), "no factory registered for controller 'PersonController'");

        let err = ApplicationError::from(ConfigError::invalid_value("routing.api_prefix", "bad"));
        assert!(err.to_string().starts_with("invalid configuration"));

        let err = ApplicationError::from(UrlError::UnknownParser { name: "gopher".to_string() });
        assert!(err.to_string().contains("gopher"));
    }
}
