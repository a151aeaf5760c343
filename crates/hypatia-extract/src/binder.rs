//! Argument binding.
//!
//! An [`ArgumentBinder`] holds one [`ValueBinder`] per parameter source and
//! asks the right one for every argument of an operation. Binders return
//! `None` for an absent value; the [`ArgumentBinder`] decides whether that
//! is an error.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use hypatia_core::{Arguments, ParameterSource, TypeDescriptor};
use hypatia_router::{ArgumentInfo, OperationInfo};
use serde_json::Value;

use crate::context::{BindingContext, BodyContent};
use crate::error::{BindingError, BindingSource};

/// Position of an argument among the operation's arguments that share its
/// source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position<'a> {
    /// Zero-based index in declaration order.
    pub index: usize,
    /// Names of every argument with the same source, in declaration order.
    pub peers: &'a [&'a str],
}

impl Position<'_> {
    /// Returns the number of arguments with the same source.
    #[must_use]
    pub fn count(&self) -> usize {
        self.peers.len()
    }
}

/// Reads one argument value from a request.
#[async_trait]
pub trait ValueBinder: Send + Sync + fmt::Debug {
    /// Returns the argument's value, or `None` when the request has none.
    async fn bind(
        &self,
        argument: &ArgumentInfo,
        position: Position<'_>,
        ctx: &BindingContext<'_>,
    ) -> Result<Option<Value>, BindingError>;
}

/// Binds path variables captured by the route template.
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlBinder;

#[async_trait]
impl ValueBinder for UrlBinder {
    async fn bind(
        &self,
        argument: &ArgumentInfo,
        _position: Position<'_>,
        ctx: &BindingContext<'_>,
    ) -> Result<Option<Value>, BindingError> {
        ctx.route_values()
            .get(argument.name())
            .map(|text| {
                argument
                    .ty()
                    .convert_text(text)
                    .map_err(|e| BindingError::from_conversion(BindingSource::Url, argument.name(), &e))
            })
            .transpose()
    }
}

/// Binds query string parameters; names match without regard to case and
/// collections take every repeated value.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryBinder;

#[async_trait]
impl ValueBinder for QueryBinder {
    async fn bind(
        &self,
        argument: &ArgumentInfo,
        _position: Position<'_>,
        ctx: &BindingContext<'_>,
    ) -> Result<Option<Value>, BindingError> {
        let Some(parameters) = ctx.request().url().parameters() else {
            return Ok(None);
        };
        let texts: Vec<&str> = parameters.get_all(argument.name()).collect();
        convert_texts(BindingSource::Query, argument, &texts)
    }
}

/// Binds request headers.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderBinder;

#[async_trait]
impl ValueBinder for HeaderBinder {
    async fn bind(
        &self,
        argument: &ArgumentInfo,
        _position: Position<'_>,
        ctx: &BindingContext<'_>,
    ) -> Result<Option<Value>, BindingError> {
        let ParameterSource::Header(header) = argument.source() else {
            return Ok(None);
        };
        let texts = ctx
            .request()
            .headers()
            .get_all(header.as_str())
            .iter()
            .map(|value| {
                value
                    .to_str()
                    .map_err(|e| BindingError::invalid_type(BindingSource::Header, argument.name(), e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        convert_texts(BindingSource::Header, argument, &texts)
    }
}

/// Binds body parameters.
///
/// Form and multipart bodies are split into fields, matched by name. A
/// parameter no field names takes the next field no parameter names. Other bodies go through the best input converter:
/// whole for a single body parameter, as one document split by name or
/// position when several share it.
#[derive(Debug, Default, Clone, Copy)]
pub struct BodyBinder;

#[async_trait]
impl ValueBinder for BodyBinder {
    async fn bind(
        &self,
        argument: &ArgumentInfo,
        position: Position<'_>,
        ctx: &BindingContext<'_>,
    ) -> Result<Option<Value>, BindingError> {
        match ctx.body().await? {
            BodyContent::Fields(fields) => {
                let texts = fields.values_for(position.peers, position.index);
                convert_texts(BindingSource::Body, argument, &texts)
            }
            BodyContent::Raw(raw) if position.count() == 1 => {
                let converter = ctx
                    .converters()
                    .find_best_input_converter(argument.ty(), ctx.request(), false)
                    .map_err(|e| BindingError::from_converter(argument.name(), &e))?;
                tracing::debug!(
                    parameter = argument.name(),
                    converter = converter.name(),
                    "binding body parameter"
                );
                converter
                    .convert_to(argument.ty(), raw, ctx.request())
                    .await
                    .map(Some)
                    .map_err(|e| BindingError::from_conversion(BindingSource::Body, argument.name(), &e))
            }
            BodyContent::Raw(raw) => {
                let document = ctx.body_document(argument.name(), raw).await?;
                let piece = match document {
                    Value::Object(members) => members
                        .iter()
                        .find(|(name, _)| name.eq_ignore_ascii_case(argument.name()))
                        .map(|(_, value)| value),
                    Value::Array(items) => items.get(position.index),
                    _ => None,
                };
                match piece {
                    Some(value) if argument.ty().accepts(value) => Ok(Some(value.clone())),
                    Some(value) => Err(BindingError::invalid_type(
                        BindingSource::Body,
                        argument.name(),
                        format!("expected {}, got {value}", argument.ty()),
                    )),
                    None => Ok(None),
                }
            }
        }
    }
}

fn convert_texts(
    source: BindingSource,
    argument: &ArgumentInfo,
    texts: &[&str],
) -> Result<Option<Value>, BindingError> {
    if texts.is_empty() {
        return Ok(None);
    }
    argument
        .ty()
        .convert_texts(texts)
        .map(Some)
        .map_err(|e| BindingError::from_conversion(source, argument.name(), &e))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Url,
    Query,
    Header,
    Body,
}

impl SourceKind {
    fn of(source: &ParameterSource) -> Self {
        match source {
            ParameterSource::Url => Self::Url,
            ParameterSource::Query => Self::Query,
            ParameterSource::Header(_) => Self::Header,
            ParameterSource::Body => Self::Body,
        }
    }

    fn binding_source(self) -> BindingSource {
        match self {
            Self::Url => BindingSource::Url,
            Self::Query => BindingSource::Query,
            Self::Header => BindingSource::Header,
            Self::Body => BindingSource::Body,
        }
    }
}

/// Binds every argument of an operation.
///
/// ```rust
/// use hypatia_core::{fixtures, ConverterProvider, RequestInfo};
/// use hypatia_extract::{ArgumentBinder, BindingContext, BindingLimits};
/// use hypatia_router::{ControllerDescriptionBuilder, RouteValues};
/// use hypatia_url::UrlParserRegistry;
/// use http::Method;
/// use serde_json::json;
///
/// let controller = ControllerDescriptionBuilder::new()
///     .build(&fixtures::TestController::metadata())
///     .unwrap();
/// let add = controller.operation("Add").unwrap();
///
/// let url = UrlParserRegistry::with_defaults()
///     .parse("/api/test/add?operandB=2&operandA=1")
///     .unwrap();
/// let request = RequestInfo::new(Method::GET, url);
/// let values = RouteValues::new();
/// let converters = ConverterProvider::default();
/// let ctx = BindingContext::new(&request, &values, &converters, BindingLimits::default());
///
/// let arguments = tokio_test::block_on(ArgumentBinder::new().bind(add, &ctx)).unwrap();
/// assert_eq!(arguments.get("operandA"), Some(&json!(1)));
/// assert_eq!(arguments.get("operandB"), Some(&json!(2)));
/// ```
#[derive(Debug, Clone)]
pub struct ArgumentBinder {
    url: Arc<dyn ValueBinder>,
    query: Arc<dyn ValueBinder>,
    header: Arc<dyn ValueBinder>,
    body: Arc<dyn ValueBinder>,
}

impl Default for ArgumentBinder {
    fn default() -> Self {
        Self {
            url: Arc::new(UrlBinder),
            query: Arc::new(QueryBinder),
            header: Arc::new(HeaderBinder),
            body: Arc::new(BodyBinder),
        }
    }
}

impl ArgumentBinder {
    /// Creates a binder with the built-in per-source binders.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the binder for path variables.
    #[must_use]
    pub fn with_url_binder(mut self, binder: Arc<dyn ValueBinder>) -> Self {
        self.url = binder;
        self
    }

    /// Replaces the binder for query parameters.
    #[must_use]
    pub fn with_query_binder(mut self, binder: Arc<dyn ValueBinder>) -> Self {
        self.query = binder;
        self
    }

    /// Replaces the binder for headers.
    #[must_use]
    pub fn with_header_binder(mut self, binder: Arc<dyn ValueBinder>) -> Self {
        self.header = binder;
        self
    }

    /// Replaces the binder for body parameters.
    #[must_use]
    pub fn with_body_binder(mut self, binder: Arc<dyn ValueBinder>) -> Self {
        self.body = binder;
        self
    }

    fn binder_for(&self, kind: SourceKind) -> &Arc<dyn ValueBinder> {
        match kind {
            SourceKind::Url => &self.url,
            SourceKind::Query => &self.query,
            SourceKind::Header => &self.header,
            SourceKind::Body => &self.body,
        }
    }

    /// Binds the operation's arguments in declaration order.
    ///
    /// An absent value binds as `null` for optional parameters and as an
    /// empty array for collections; for anything else it is a
    /// missing-parameter error.
    pub async fn bind(
        &self,
        operation: &OperationInfo,
        ctx: &BindingContext<'_>,
    ) -> Result<Arguments, BindingError> {
        if ctx.request().cancellation().is_cancelled() {
            return Err(BindingError::cancelled());
        }

        let kinds: Vec<SourceKind> = operation
            .arguments()
            .iter()
            .map(|argument| SourceKind::of(argument.source()))
            .collect();

        let peers_of = |kind: SourceKind| {
            operation
                .arguments()
                .iter()
                .zip(&kinds)
                .filter(|(_, k)| **k == kind)
                .map(|(argument, _)| argument.name())
                .collect::<Vec<_>>()
        };
        let peers = [
            peers_of(SourceKind::Url),
            peers_of(SourceKind::Query),
            peers_of(SourceKind::Header),
            peers_of(SourceKind::Body),
        ];

        let mut arguments = Arguments::new();
        for (i, argument) in operation.arguments().iter().enumerate() {
            let kind = kinds[i];
            let position = Position {
                index: kinds[..i].iter().filter(|k| **k == kind).count(),
                peers: &peers[kind as usize],
            };

            let bound = self.binder_for(kind).bind(argument, position, ctx).await?;
            let value = match bound {
                Some(value) if !value.is_null() => value,
                _ => absent_value(argument, kind)?,
            };
            tracing::debug!(
                operation = operation.method_name(),
                parameter = argument.name(),
                source = %kind.binding_source(),
                "bound argument"
            );
            arguments.push(argument.name(), value);
        }
        Ok(arguments)
    }
}

fn absent_value(argument: &ArgumentInfo, kind: SourceKind) -> Result<Value, BindingError> {
    match argument.ty() {
        TypeDescriptor::Optional(_) | TypeDescriptor::Unit | TypeDescriptor::Any => Ok(Value::Null),
        TypeDescriptor::Array(_) => Ok(Value::Array(Vec::new())),
        _ => Err(BindingError::missing(kind.binding_source(), argument.name())),
    }
}
