//! Pipeline errors and their rendering.
//!
//! Every stage failure becomes a [`PipelineError`]. Its [`ErrorCategory`]
//! picks the status; the body is a JSON envelope:
//!
//! ```json
//! {
//!   "error": {
//!     "code": "MISSING_PARAMETER",
//!     "message": "missing required query parameter 'operandB'",
//!     "category": "validation"
//!   },
//!   "request_id": "0192f5c4-..."
//! }
//! ```

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Response, StatusCode};
use hypatia_core::{ActivationError, ConversionError, ConverterError, ErrorCategory, RequestId};
use hypatia_extract::BindingError;
use hypatia_url::UrlError;
use serde::Serialize;
use thiserror::Error;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// A request could not be processed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request URL did not parse.
    #[error(transparent)]
    Url(#[from] UrlError),

    /// No operation matches the verb and URL.
    #[error("no route matches {method} {url}")]
    NoMatchingRoute {
        /// Request verb.
        method: String,
        /// Request URL.
        url: String,
    },

    /// The mapped controller could not be created.
    #[error(transparent)]
    Activation(#[from] ActivationError),

    /// An argument could not be bound.
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// No converter can write the result.
    #[error(transparent)]
    Converter(#[from] ConverterError),

    /// The result could not be written.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The caller went away.
    #[error("request cancelled")]
    Cancelled,

    /// The invoked operation failed.
    #[error("operation '{operation}' failed: {source}")]
    Operation {
        /// `Controller.Method` of the failed operation.
        operation: String,
        /// Error raised by the operation.
        #[source]
        source: anyhow::Error,
    },

    /// A pre- or post-request handler failed.
    #[error("request handler '{handler}' failed: {source}")]
    Handler {
        /// Handler name.
        handler: String,
        /// Error raised by the handler.
        #[source]
        source: anyhow::Error,
    },

    /// An operation result does not fit its declared convention.
    #[error("operation '{operation}' returned an unusable result: {reason}")]
    InvalidResult {
        /// `Controller.Method` of the operation.
        operation: String,
        /// What was wrong.
        reason: String,
    },
}

impl PipelineError {
    /// Returns `true` when no route matched; a host may forward such
    /// requests instead of answering 404.
    #[must_use]
    pub fn is_no_matching_route(&self) -> bool {
        matches!(self, Self::NoMatchingRoute { .. })
    }

    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Url(_) => ErrorCategory::Validation,
            Self::NoMatchingRoute { .. } => ErrorCategory::NotFound,
            Self::Binding(e) => e.category(),
            Self::Converter(e) => e.category(),
            Self::Conversion(e) => e.category(),
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Activation(_)
            | Self::Operation { .. }
            | Self::Handler { .. }
            | Self::InvalidResult { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.category().status_code()
    }

    /// Returns the machine readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Binding(e) => e.error_code(),
            Self::NoMatchingRoute { .. } => "NO_MATCHING_ROUTE",
            other => other.category().error_code(),
        }
    }

    /// Builds the JSON error envelope. Internal details are replaced by a
    /// generic message unless `expose_internal` is set.
    #[must_use]
    pub fn envelope(&self, request_id: RequestId, expose_internal: bool) -> ErrorEnvelope {
        let category = self.category();
        let message = if category == ErrorCategory::Internal && !expose_internal {
            INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        };
        ErrorEnvelope {
            error: ErrorBody {
                code: self.error_code(),
                message,
                category,
            },
            request_id: request_id.to_string(),
        }
    }

    /// Renders this error as an HTTP response.
    #[must_use]
    pub fn to_response(&self, request_id: RequestId, expose_internal: bool) -> Response<Bytes> {
        let envelope = self.envelope(request_id, expose_internal);
        let body = serde_json::to_vec(&envelope).unwrap_or_default();

        let mut response = Response::new(Bytes::from(body));
        *response.status_mut() = self.status_code();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

/// JSON error envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    /// The error.
    pub error: ErrorBody,
    /// Request the error belongs to.
    pub request_id: String,
}

/// Error details inside an [`ErrorEnvelope`].
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Machine readable code.
    pub code: &'static str,
    /// Human readable message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
}
