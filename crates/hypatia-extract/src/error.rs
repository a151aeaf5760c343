//! Binding error types.
//!
//! A [`BindingError`] names the parameter that could not be bound and the
//! part of the request it was read from.

use std::fmt;

use http::StatusCode;
use hypatia_core::{BodyError, ConversionError, ConverterError, ErrorCategory};

/// Where a parameter value was being read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSource {
    /// A path variable of the route template.
    Url,
    /// The query string.
    Query,
    /// A request header.
    Header,
    /// The request body.
    Body,
    /// The `Content-Type` header of the body.
    ContentType,
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url => write!(f, "url"),
            Self::Query => write!(f, "query"),
            Self::Header => write!(f, "header"),
            Self::Body => write!(f, "body"),
            Self::ContentType => write!(f, "content-type"),
        }
    }
}

/// An operation argument could not be bound.
///
/// ```rust
/// use hypatia_core::ErrorCategory;
/// use hypatia_extract::{BindingError, BindingSource};
///
/// let err = BindingError::missing(BindingSource::Query, "operandA");
/// assert_eq!(err.category(), ErrorCategory::Validation);
/// assert_eq!(err.parameter(), Some("operandA"));
/// assert!(err.to_string().contains("operandA"));
/// ```
#[derive(Debug)]
pub struct BindingError {
    binding_source: BindingSource,
    kind: BindingErrorKind,
    parameter: Option<String>,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindingErrorKind {
    Missing,
    InvalidType,
    Malformed,
    TooManyFields,
    PayloadTooLarge,
    UnsupportedMediaType,
    Cancelled,
    Internal,
}

impl BindingError {
    /// A required parameter has no value.
    #[must_use]
    pub fn missing(source: BindingSource, parameter: impl Into<String>) -> Self {
        let parameter = parameter.into();
        Self {
            binding_source: source,
            kind: BindingErrorKind::Missing,
            message: format!("missing required {source} parameter '{parameter}'"),
            parameter: Some(parameter),
        }
    }

    /// A value could not be converted to the parameter's type.
    #[must_use]
    pub fn invalid_type(
        source: BindingSource,
        parameter: impl Into<String>,
        details: impl fmt::Display,
    ) -> Self {
        let parameter = parameter.into();
        Self {
            binding_source: source,
            kind: BindingErrorKind::InvalidType,
            message: format!("invalid {source} parameter '{parameter}': {details}"),
            parameter: Some(parameter),
        }
    }

    /// The payload could not be decomposed.
    #[must_use]
    pub fn malformed(source: BindingSource, details: impl fmt::Display) -> Self {
        Self {
            binding_source: source,
            kind: BindingErrorKind::Malformed,
            message: format!("malformed {source}: {details}"),
            parameter: None,
        }
    }

    /// A multipart body carried more fields than allowed.
    #[must_use]
    pub fn too_many_fields(max_fields: usize) -> Self {
        Self {
            binding_source: BindingSource::Body,
            kind: BindingErrorKind::TooManyFields,
            message: format!("too many multipart fields (max {max_fields})"),
            parameter: None,
        }
    }

    /// The body exceeded the configured limit.
    #[must_use]
    pub fn payload_too_large(limit: usize) -> Self {
        Self {
            binding_source: BindingSource::Body,
            kind: BindingErrorKind::PayloadTooLarge,
            message: format!("payload too large: max {limit} bytes"),
            parameter: None,
        }
    }

    /// No converter reads the body as the parameter's type.
    #[must_use]
    pub fn unsupported_media_type(parameter: impl Into<String>, details: impl fmt::Display) -> Self {
        Self {
            binding_source: BindingSource::ContentType,
            kind: BindingErrorKind::UnsupportedMediaType,
            message: details.to_string(),
            parameter: Some(parameter.into()),
        }
    }

    /// The request was cancelled while binding.
    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            binding_source: BindingSource::Body,
            kind: BindingErrorKind::Cancelled,
            message: "request cancelled while binding arguments".to_string(),
            parameter: None,
        }
    }

    /// A converter failure for `parameter`, classified by its category.
    #[must_use]
    pub fn from_conversion(
        source: BindingSource,
        parameter: impl Into<String>,
        error: &ConversionError,
    ) -> Self {
        match error.category() {
            ErrorCategory::Cancelled => Self::cancelled(),
            ErrorCategory::Validation => Self::invalid_type(source, parameter, error),
            _ => Self {
                binding_source: source,
                kind: BindingErrorKind::Internal,
                message: error.to_string(),
                parameter: Some(parameter.into()),
            },
        }
    }

    /// A converter selection failure for `parameter`.
    #[must_use]
    pub fn from_converter(parameter: impl Into<String>, error: &ConverterError) -> Self {
        match error.category() {
            ErrorCategory::UnsupportedMediaType => Self::unsupported_media_type(parameter, error),
            _ => Self {
                binding_source: BindingSource::Body,
                kind: BindingErrorKind::Internal,
                message: error.to_string(),
                parameter: Some(parameter.into()),
            },
        }
    }

    /// Returns where the value was being read from.
    #[must_use]
    pub fn binding_source(&self) -> BindingSource {
        self.binding_source
    }

    /// Returns the parameter name, if the failure concerns one.
    #[must_use]
    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }

    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self.kind {
            BindingErrorKind::Missing
            | BindingErrorKind::InvalidType
            | BindingErrorKind::Malformed
            | BindingErrorKind::TooManyFields => ErrorCategory::Validation,
            BindingErrorKind::PayloadTooLarge => ErrorCategory::PayloadTooLarge,
            BindingErrorKind::UnsupportedMediaType => ErrorCategory::UnsupportedMediaType,
            BindingErrorKind::Cancelled => ErrorCategory::Cancelled,
            BindingErrorKind::Internal => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.category().status_code()
    }

    /// Returns the error code suitable for error envelopes.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            BindingErrorKind::Missing => "MISSING_PARAMETER",
            BindingErrorKind::InvalidType => "INVALID_PARAMETER",
            BindingErrorKind::Malformed => "MALFORMED_BODY",
            BindingErrorKind::TooManyFields => "TOO_MANY_FIELDS",
            _ => self.category().error_code(),
        }
    }
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BindingError {}

impl From<BodyError> for BindingError {
    fn from(error: BodyError) -> Self {
        match error {
            BodyError::TooLarge { limit } => Self::payload_too_large(limit),
            BodyError::Cancelled => Self::cancelled(),
            BodyError::Io(source) => Self::malformed(BindingSource::Body, source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_error() {
        let err = BindingError::missing(BindingSource::Url, "id");

        assert_eq!(err.binding_source(), BindingSource::Url);
        assert_eq!(err.parameter(), Some("id"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "MISSING_PARAMETER");
        assert_eq!(err.to_string(), "missing required url parameter 'id'");
    }

    #[test]
    fn test_invalid_type_names_parameter() {
        let conversion = ConversionError::invalid("integer", "abc");
        let err = BindingError::from_conversion(BindingSource::Query, "operandA", &conversion);

        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
        assert!(err.to_string().contains("operandA"));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_body_errors_keep_their_category() {
        let too_large = BindingError::from(BodyError::TooLarge { limit: 16 });
        assert_eq!(too_large.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(too_large.error_code(), "PAYLOAD_TOO_LARGE");

        let cancelled = BindingError::from(BodyError::Cancelled);
        assert_eq!(cancelled.category(), ErrorCategory::Cancelled);
        assert_eq!(cancelled.status_code().as_u16(), 499);
    }

    #[test]
    fn test_converter_selection_failure_is_unsupported_media_type() {
        let err = BindingError::from_converter(
            "person",
            &ConverterError::NoInputConverter {
                type_name: "Person".into(),
                content_type: "text/csv".into(),
            },
        );
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(err.binding_source(), BindingSource::ContentType);

        let err = BindingError::from_converter("person", &ConverterError::NotInitialized);
        assert_eq!(err.category(), ErrorCategory::Internal);
    }
}
