//! Per-request binding context.
//!
//! The [`BindingContext`] gives binders access to the request, the values
//! captured by the route template and the converter set. The body is read
//! and decomposed at most once, however many parameters it feeds.

use bytes::Bytes;
use hypatia_core::{media_type_essence, ConverterProvider, RequestInfo, TypeDescriptor};
use hypatia_router::RouteValues;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::error::{BindingError, BindingSource};
use crate::form::{FormFields, FORM_URLENCODED};
use crate::limits::BindingLimits;
use crate::multipart::{read_multipart, MULTIPART_FORM_DATA};

/// A request body as seen by the body binder.
#[derive(Debug, Clone)]
pub enum BodyContent {
    /// Form-shaped bodies, split into named fields.
    Fields(FormFields),
    /// Any other payload, left for a converter.
    Raw(Bytes),
}

/// Everything binders need to read one request.
///
/// ```rust
/// use hypatia_core::{ConverterProvider, RequestInfo};
/// use hypatia_extract::{BindingContext, BindingLimits};
/// use hypatia_router::RouteValues;
/// use hypatia_url::UrlParserRegistry;
/// use http::Method;
///
/// let url = UrlParserRegistry::with_defaults().parse("/api/person/7").unwrap();
/// let request = RequestInfo::new(Method::GET, url);
/// let mut values = RouteValues::new();
/// values.push("id", "7");
/// let converters = ConverterProvider::default();
///
/// let ctx = BindingContext::new(&request, &values, &converters, BindingLimits::default());
/// assert_eq!(ctx.route_values().get("id"), Some("7"));
/// ```
#[derive(Debug)]
pub struct BindingContext<'a> {
    request: &'a RequestInfo,
    route_values: &'a RouteValues,
    converters: &'a ConverterProvider,
    limits: BindingLimits,
    body: OnceCell<BodyContent>,
    document: OnceCell<Value>,
}

impl<'a> BindingContext<'a> {
    /// Creates a context for one request.
    #[must_use]
    pub fn new(
        request: &'a RequestInfo,
        route_values: &'a RouteValues,
        converters: &'a ConverterProvider,
        limits: BindingLimits,
    ) -> Self {
        Self {
            request,
            route_values,
            converters,
            limits,
            body: OnceCell::new(),
            document: OnceCell::new(),
        }
    }

    /// Returns the request.
    #[must_use]
    pub fn request(&self) -> &'a RequestInfo {
        self.request
    }

    /// Returns the values captured from the URL by the route template.
    #[must_use]
    pub fn route_values(&self) -> &'a RouteValues {
        self.route_values
    }

    /// Returns the converter set.
    #[must_use]
    pub fn converters(&self) -> &'a ConverterProvider {
        self.converters
    }

    /// Returns the body limits.
    #[must_use]
    pub fn limits(&self) -> BindingLimits {
        self.limits
    }

    /// Reads the body, splitting form and multipart payloads into fields.
    pub async fn body(&self) -> Result<&BodyContent, BindingError> {
        self.body
            .get_or_try_init(|| async {
                let bytes = self
                    .request
                    .body()
                    .bytes(self.limits.max_body_bytes, self.request.cancellation())
                    .await?;

                let content_type = self.request.content_type().unwrap_or_default();
                match media_type_essence(content_type).as_deref() {
                    Some(FORM_URLENCODED) => FormFields::from_urlencoded(&bytes).map(BodyContent::Fields),
                    Some(MULTIPART_FORM_DATA) => {
                        read_multipart(content_type, bytes, self.limits.max_multipart_fields)
                            .await
                            .map(BodyContent::Fields)
                    }
                    _ => Ok(BodyContent::Raw(bytes)),
                }
            })
            .await
    }

    /// Converts a raw body to a single untyped document, shared by every
    /// body parameter that takes a piece of it.
    pub(crate) async fn body_document(&self, parameter: &str, raw: &Bytes) -> Result<&Value, BindingError> {
        self.document
            .get_or_try_init(|| async {
                let any = TypeDescriptor::Any;
                let converter = self
                    .converters
                    .find_best_input_converter(&any, self.request, false)
                    .map_err(|e| BindingError::from_converter(parameter, &e))?;
                converter
                    .convert_to(&any, raw, self.request)
                    .await
                    .map_err(|e| BindingError::from_conversion(BindingSource::Body, parameter, &e))
            })
            .await
    }
}
