//! The request pipeline.
//!
//! ```text
//! pre-request handlers -> DelegateMapper -> ArgumentBinder -> invoke
//!     -> ResponseComposer -> post-request handlers
//! ```
//!
//! [`RequestHandler::process`] runs the stages and returns stage failures
//! as [`PipelineError`]s, so a host can tell an unmatched route apart and
//! forward it. [`RequestHandler::handle`] also renders errors, tags the
//! response with its request ID and records metrics.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::header::HeaderValue;
use http::{Request, Response};
use hypatia_core::{ConverterProvider, RequestId, RequestInfo, ResponseInfo};
use hypatia_extract::{ArgumentBinder, BindingContext, BindingLimits};
use hypatia_router::{DelegateMapper, MappingTarget, OperationInfo, RequestMapping};
use hypatia_telemetry::metrics::{record_request, record_unmatched};
use hypatia_url::UrlParserRegistry;
use tracing::Instrument;

use crate::composer::ResponseComposer;
use crate::error::PipelineError;
use crate::handlers::{PostRequestHandler, PreRequestHandler, PreRequestOutcome};

/// Header carrying the request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Processes requests against the registered controllers.
#[derive(Debug)]
pub struct RequestHandler {
    parsers: Arc<UrlParserRegistry>,
    mapper: Arc<DelegateMapper>,
    converters: Arc<ConverterProvider>,
    binder: ArgumentBinder,
    composer: ResponseComposer,
    limits: BindingLimits,
    pre: Vec<Arc<dyn PreRequestHandler>>,
    post: Vec<Arc<dyn PostRequestHandler>>,
    expose_internal_errors: bool,
}

impl RequestHandler {
    /// Starts building a handler over `mapper` writing bodies with
    /// `converters`.
    #[must_use]
    pub fn builder(mapper: Arc<DelegateMapper>, converters: Arc<ConverterProvider>) -> RequestHandlerBuilder {
        RequestHandlerBuilder::new(mapper, converters)
    }

    /// Returns the URL parsers used for raw HTTP requests.
    #[must_use]
    pub fn url_parsers(&self) -> &UrlParserRegistry {
        &self.parsers
    }

    /// Returns the mapper.
    #[must_use]
    pub fn mapper(&self) -> &DelegateMapper {
        &self.mapper
    }

    /// Runs the pipeline without rendering errors.
    pub async fn process(&self, request: Arc<RequestInfo>) -> Result<ResponseInfo, PipelineError> {
        for handler in &self.pre {
            let outcome = handler
                .handle(&request)
                .await
                .map_err(|source| PipelineError::Handler {
                    handler: handler.name().to_string(),
                    source,
                })?;
            if let PreRequestOutcome::Respond(response) = outcome {
                tracing::debug!(handler = handler.name(), "pre-request handler answered");
                return Ok(response);
            }
        }

        let mapping = self
            .mapper
            .map_request(&request)?
            .ok_or_else(|| PipelineError::NoMatchingRoute {
                method: request.method().to_string(),
                url: request.url().to_string(),
            })?;

        let mut response = ResponseInfo::new(Arc::clone(&request));
        match mapping.target() {
            MappingTarget::Options { allow } => self.composer.compose_options(allow, &mut response),
            MappingTarget::Operation(operation) => {
                self.invoke(&mapping, operation, &request, &mut response).await?;
            }
        }

        for handler in &self.post {
            handler
                .handle(&mut response)
                .await
                .map_err(|source| PipelineError::Handler {
                    handler: handler.name().to_string(),
                    source,
                })?;
        }
        Ok(response)
    }

    async fn invoke(
        &self,
        mapping: &RequestMapping,
        operation: &OperationInfo,
        request: &RequestInfo,
        response: &mut ResponseInfo,
    ) -> Result<(), PipelineError> {
        let ctx = BindingContext::new(request, mapping.route_values(), &self.converters, self.limits);
        let arguments = self.binder.bind(operation, &ctx).await?;

        let cancellation = request.cancellation();
        if cancellation.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let invocation = tokio::select! {
            biased;
            () = cancellation.cancelled() => return Err(PipelineError::Cancelled),
            result = mapping.instance().invoke(operation.method_name(), arguments, response) => {
                result.map_err(|source| PipelineError::Operation {
                    operation: format!("{}.{}", operation.controller(), operation.method_name()),
                    source,
                })?
            }
        };

        self.composer.compose(mapping, operation, &invocation, response).await
    }

    /// Runs the pipeline and renders the outcome.
    ///
    /// Errors become JSON envelopes; every response carries the
    /// `x-request-id` header.
    pub async fn handle(&self, request: RequestInfo) -> Response<Bytes> {
        let started = Instant::now();
        let request = Arc::new(request);
        let request_id = request.request_id();
        let verb = request.method().clone();
        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            method = %verb,
            url = %request.url(),
        );

        let result = self.process(Arc::clone(&request)).instrument(span.clone()).await;
        let response = match result {
            Ok(response) => response.into_http(),
            Err(error) => span.in_scope(|| self.render_error(&error, request_id, verb.as_str())),
        };

        let response = with_request_id(response, request_id);
        let status = response.status().as_u16();
        record_request(verb.as_str(), status, started.elapsed());
        span.in_scope(|| {
            tracing::info!(
                status,
                duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "request completed"
            );
        });
        response
    }

    /// Converts a raw HTTP request and handles it.
    pub async fn handle_http(&self, request: Request<Bytes>) -> Response<Bytes> {
        match self.request_from_http(request) {
            Ok(request) => self.handle(request).await,
            Err(error) => {
                let request_id = RequestId::new();
                let response = self.render_error(&error, request_id, "unknown");
                with_request_id(response, request_id)
            }
        }
    }

    /// Converts a raw HTTP request, parsing its URL with the registered
    /// parsers. An incoming `x-request-id` is kept when it is a valid ID.
    pub fn request_from_http(&self, request: Request<Bytes>) -> Result<RequestInfo, PipelineError> {
        let (parts, body) = request.into_parts();
        let url = self.parsers.parse(&parts.uri.to_string())?;
        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<RequestId>().ok());

        let request = RequestInfo::new(parts.method, url)
            .with_headers(parts.headers)
            .with_body(body);
        Ok(match request_id {
            Some(id) => request.with_request_id(id),
            None => request,
        })
    }

    fn render_error(&self, error: &PipelineError, request_id: RequestId, verb: &str) -> Response<Bytes> {
        if error.is_no_matching_route() {
            record_unmatched(verb);
        }
        if error.status_code().is_server_error() {
            tracing::error!(error = %error, code = error.error_code(), "request failed");
        } else {
            tracing::debug!(error = %error, code = error.error_code(), "request rejected");
        }
        error.to_response(request_id, self.expose_internal_errors)
    }
}

fn with_request_id(mut response: Response<Bytes>, request_id: RequestId) -> Response<Bytes> {
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Builder for [`RequestHandler`].
#[derive(Debug)]
pub struct RequestHandlerBuilder {
    parsers: Option<Arc<UrlParserRegistry>>,
    mapper: Arc<DelegateMapper>,
    converters: Arc<ConverterProvider>,
    binder: ArgumentBinder,
    limits: BindingLimits,
    pre: Vec<Arc<dyn PreRequestHandler>>,
    post: Vec<Arc<dyn PostRequestHandler>>,
    expose_internal_errors: bool,
}

impl RequestHandlerBuilder {
    /// Creates a builder with default parsers, binder and limits.
    #[must_use]
    pub fn new(mapper: Arc<DelegateMapper>, converters: Arc<ConverterProvider>) -> Self {
        Self {
            parsers: None,
            mapper,
            converters,
            binder: ArgumentBinder::new(),
            limits: BindingLimits::default(),
            pre: Vec::new(),
            post: Vec::new(),
            expose_internal_errors: false,
        }
    }

    /// Sets the URL parsers used for raw HTTP requests.
    #[must_use]
    pub fn url_parsers(mut self, parsers: Arc<UrlParserRegistry>) -> Self {
        self.parsers = Some(parsers);
        self
    }

    /// Replaces the argument binder.
    #[must_use]
    pub fn binder(mut self, binder: ArgumentBinder) -> Self {
        self.binder = binder;
        self
    }

    /// Sets the body limits.
    #[must_use]
    pub fn limits(mut self, limits: BindingLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Appends a pre-request handler.
    #[must_use]
    pub fn pre_handler(mut self, handler: Arc<dyn PreRequestHandler>) -> Self {
        self.pre.push(handler);
        self
    }

    /// Appends a post-request handler.
    #[must_use]
    pub fn post_handler(mut self, handler: Arc<dyn PostRequestHandler>) -> Self {
        self.post.push(handler);
        self
    }

    /// Shows internal error messages in error envelopes. Development only.
    #[must_use]
    pub fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    /// Builds the handler.
    #[must_use]
    pub fn build(self) -> RequestHandler {
        RequestHandler {
            parsers: self
                .parsers
                .unwrap_or_else(|| Arc::new(UrlParserRegistry::with_defaults())),
            composer: ResponseComposer::new(Arc::clone(&self.converters)),
            mapper: self.mapper,
            converters: self.converters,
            binder: self.binder,
            limits: self.limits,
            pre: self.pre,
            post: self.post,
            expose_internal_errors: self.expose_internal_errors,
        }
    }
}
