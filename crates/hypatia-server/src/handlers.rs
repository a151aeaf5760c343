//! Pre- and post-request handlers.
//!
//! Pre-request handlers run before mapping, in registration order, and may
//! answer the request themselves (authentication, for instance). Post-request
//! handlers run after a response was composed and may change it.

use async_trait::async_trait;
use hypatia_core::{RequestInfo, ResponseInfo};

/// What a pre-request handler decided.
#[derive(Debug)]
pub enum PreRequestOutcome {
    /// Continue with the next handler and then the operation.
    Continue,
    /// Stop and send this response.
    Respond(ResponseInfo),
}

/// Runs before a request is mapped.
///
/// ```rust
/// use async_trait::async_trait;
/// use http::StatusCode;
/// use hypatia_core::{RequestInfo, ResponseInfo};
/// use hypatia_server::{PreRequestHandler, PreRequestOutcome};
/// use std::sync::Arc;
///
/// #[derive(Debug)]
/// struct RequireApiKey;
///
/// #[async_trait]
/// impl PreRequestHandler for RequireApiKey {
///     fn name(&self) -> &str {
///         "require-api-key"
///     }
///
///     async fn handle(&self, request: &Arc<RequestInfo>) -> anyhow::Result<PreRequestOutcome> {
///         if request.header("x-api-key").is_some() {
///             return Ok(PreRequestOutcome::Continue);
///         }
///         let mut response = ResponseInfo::new(Arc::clone(request));
///         response.set_status(StatusCode::UNAUTHORIZED);
///         Ok(PreRequestOutcome::Respond(response))
///     }
/// }
/// ```
#[async_trait]
pub trait PreRequestHandler: Send + Sync + std::fmt::Debug {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Inspects the request.
    async fn handle(&self, request: &std::sync::Arc<RequestInfo>) -> anyhow::Result<PreRequestOutcome>;
}

/// Runs after a response was composed.
#[async_trait]
pub trait PostRequestHandler: Send + Sync + std::fmt::Debug {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Inspects or changes the response.
    async fn handle(&self, response: &mut ResponseInfo) -> anyhow::Result<()>;
}
