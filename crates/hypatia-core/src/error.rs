//! Error types shared by the Hypatia pipeline stages.
//!
//! Each stage has its own error enum; all of them classify into an
//! [`ErrorCategory`], which decides the HTTP status used when the error is
//! rendered.
//!
//! | `ErrorCategory` | Status |
//! |---|---|
//! | `Validation` | 400 |
//! | `NotFound` | 404 |
//! | `PayloadTooLarge` | 413 |
//! | `UnsupportedMediaType` | 415 |
//! | `NotAcceptable` | 406 |
//! | `Cancelled` | 499 |
//! | `Internal` | 500 |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categories of errors for classification and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed URL, unbindable argument or unconvertible value.
    Validation,
    /// No route matched the request.
    NotFound,
    /// Request body exceeded the configured limit.
    PayloadTooLarge,
    /// No converter can read the request body.
    UnsupportedMediaType,
    /// No converter can write the response body.
    NotAcceptable,
    /// The caller went away before processing finished.
    Cancelled,
    /// Configuration problems and failures raised by operations.
    Internal,
}

impl ErrorCategory {
    /// Returns the HTTP status code for this category.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            // nginx's "client closed request"
            Self::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the stable, machine readable code used in error envelopes.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            Self::NotAcceptable => "NOT_ACCEPTABLE",
            Self::Cancelled => "REQUEST_CANCELLED",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

/// A value could not be converted to or from its declared type.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Text could not be read as the expected type.
    #[error("cannot convert '{value}' to {expected}")]
    InvalidValue {
        /// Name of the expected type.
        expected: String,
        /// The offending text.
        value: String,
    },

    /// A body could not be deserialized.
    #[error("invalid {media_type} payload: {source}")]
    Payload {
        /// Media type the converter was reading.
        media_type: &'static str,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },

    /// A body could not be serialized.
    #[error("failed to serialize response body: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Body text was not valid UTF-8.
    #[error("body is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    /// The request was cancelled while converting.
    #[error("conversion cancelled")]
    Cancelled,
}

impl ConversionError {
    /// Creates an [`InvalidValue`](Self::InvalidValue) error.
    #[must_use]
    pub fn invalid(expected: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            expected: expected.into(),
            value: value.into(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Serialize(_) => ErrorCategory::Internal,
            Self::InvalidValue { .. } | Self::Payload { .. } | Self::Utf8(_) => {
                ErrorCategory::Validation
            }
        }
    }
}

/// Converter selection failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConverterError {
    /// The provider was used before `initialize`.
    #[error("converter provider has not been initialized")]
    NotInitialized,

    /// `initialize` was called a second time.
    #[error("converter provider is already initialized")]
    AlreadyInitialized,

    /// No converter reads the request body as the expected type.
    #[error("no converter can read '{content_type}' as {type_name}")]
    NoInputConverter {
        /// The expected type.
        type_name: String,
        /// The request content type, or `<none>`.
        content_type: String,
    },

    /// No converter writes the result type in an acceptable format.
    #[error("no converter can write {type_name} as '{accept}'")]
    NoOutputConverter {
        /// The result type.
        type_name: String,
        /// The request `Accept` header, or `<none>`.
        accept: String,
    },

    /// A converter name in configuration is not known.
    #[error("unknown converter '{0}'")]
    UnknownConverter(String),
}

impl ConverterError {
    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoInputConverter { .. } => ErrorCategory::UnsupportedMediaType,
            Self::NoOutputConverter { .. } => ErrorCategory::NotAcceptable,
            Self::NotInitialized | Self::AlreadyInitialized | Self::UnknownConverter(_) => {
                ErrorCategory::Internal
            }
        }
    }
}

/// Reading the request body failed.
#[derive(Debug, Error)]
pub enum BodyError {
    /// The body is larger than allowed.
    #[error("request body exceeds {limit} bytes")]
    TooLarge {
        /// The configured limit.
        limit: usize,
    },

    /// The body stream failed.
    #[error("failed to read request body: {0}")]
    Io(#[from] std::io::Error),

    /// The request was cancelled while reading.
    #[error("request cancelled while reading the body")]
    Cancelled,
}

impl BodyError {
    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TooLarge { .. } => ErrorCategory::PayloadTooLarge,
            Self::Io(_) => ErrorCategory::Validation,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }
}

/// A controller instance could not be created.
#[derive(Debug, Error)]
pub enum ActivationError {
    /// No factory is registered for the controller type.
    #[error("no controller registered as '{0}'")]
    UnknownController(String),

    /// The factory failed.
    #[error("failed to create controller '{controller}': {source}")]
    Failed {
        /// Controller type name.
        controller: String,
        /// Underlying error.
        #[source]
        source: anyhow::Error,
    },
}
