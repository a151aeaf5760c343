//! Body converters and converter selection.
//!
//! A [`Converter`] reads request bodies into values and writes values into
//! response bodies for one family of media types. The [`ConverterProvider`]
//! ranks the registered converters by [`CompatibilityLevel`] and picks the
//! best one for a given type and request or response.

mod json;
mod text;

use std::fmt;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::compat::CompatibilityLevel;
use crate::error::{ConversionError, ConverterError};
use crate::request::RequestInfo;
use crate::response::ResponseInfo;
use crate::types::TypeDescriptor;

pub use json::JsonConverter;
pub use text::TextConverter;

/// Converts between body bytes and values.
#[async_trait]
pub trait Converter: Send + Sync + fmt::Debug {
    /// Short name used in configuration and logs.
    fn name(&self) -> &str;

    /// Media types this converter reads and writes, preferred first.
    fn media_types(&self) -> &[&str];

    /// Returns `true` if this converter's natural item type is text.
    ///
    /// Among equally ranked converters, a non-text converter wins when the
    /// expected item type is not text.
    fn targets_string(&self) -> bool {
        false
    }

    /// How well this converter reads `request`'s body as `expected`.
    fn can_convert_to(&self, expected: &TypeDescriptor, request: &RequestInfo)
        -> CompatibilityLevel;

    /// How well this converter writes `given` into `response`.
    fn can_convert_from(&self, given: &TypeDescriptor, response: &ResponseInfo)
        -> CompatibilityLevel;

    /// Reads `body` as `expected`.
    async fn convert_to(
        &self,
        expected: &TypeDescriptor,
        body: &Bytes,
        request: &RequestInfo,
    ) -> Result<Value, ConversionError>;

    /// Writes `value` of type `given` into `response`.
    async fn convert_from(
        &self,
        given: &TypeDescriptor,
        value: &Value,
        response: &mut ResponseInfo,
    ) -> Result<(), ConversionError>;
}

/// Creates a built-in converter by name (`json` or `text`).
pub fn converter_by_name(name: &str) -> Result<Arc<dyn Converter>, ConverterError> {
    match name.to_ascii_lowercase().as_str() {
        "json" => Ok(Arc::new(JsonConverter)),
        "text" => Ok(Arc::new(TextConverter)),
        _ => Err(ConverterError::UnknownConverter(name.to_string())),
    }
}

/// Selects converters for request and response bodies.
///
/// The provider is created empty and filled once through
/// [`initialize`](Self::initialize); selection before that fails with
/// [`ConverterError::NotInitialized`]. The converter set is immutable
/// afterwards and safe to share between requests.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use hypatia_core::{ConverterProvider, JsonConverter, RequestInfo, TextConverter, TypeDescriptor};
/// use hypatia_url::UrlParserRegistry;
/// use http::Method;
///
/// let provider = ConverterProvider::new();
/// provider
///     .initialize(vec![Arc::new(TextConverter) as _, Arc::new(JsonConverter) as _])
///     .unwrap();
///
/// let url = UrlParserRegistry::with_defaults().parse("/api/test").unwrap();
/// let request = RequestInfo::new(Method::POST, url);
///
/// // equally ranked, but integers are not text
/// let converter = provider
///     .find_best_input_converter(&TypeDescriptor::integer(), &request, false)
///     .unwrap();
/// assert_eq!(converter.name(), "json");
/// ```
#[derive(Debug, Default)]
pub struct ConverterProvider {
    converters: OnceLock<Vec<Arc<dyn Converter>>>,
}

impl ConverterProvider {
    /// Creates an uninitialized provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider initialized with `converters`.
    #[must_use]
    pub fn with_converters(converters: Vec<Arc<dyn Converter>>) -> Self {
        let provider = Self::new();
        // a fresh provider cannot already be initialized
        let _ = provider.initialize(converters);
        provider
    }

    /// Installs the converter set. Registration order breaks ranking ties.
    pub fn initialize(&self, converters: Vec<Arc<dyn Converter>>) -> Result<(), ConverterError> {
        let names: Vec<_> = converters.iter().map(|c| c.name().to_string()).collect();
        self.converters
            .set(converters)
            .map_err(|_| ConverterError::AlreadyInitialized)?;
        tracing::debug!(converters = ?names, "converter provider initialized");
        Ok(())
    }

    /// Returns `true` once initialized.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.converters.get().is_some()
    }

    /// Returns the registered converters.
    pub fn converters(&self) -> Result<&[Arc<dyn Converter>], ConverterError> {
        self.converters
            .get()
            .map(Vec::as_slice)
            .ok_or(ConverterError::NotInitialized)
    }

    /// Finds the converter that best reads the request body as `expected`.
    ///
    /// Converters qualify when they match the type and, unless
    /// `ignore_protocol` is set, the request's media type. With
    /// `ignore_protocol` the protocol bits do not take part in ranking.
    pub fn find_best_input_converter(
        &self,
        expected: &TypeDescriptor,
        request: &RequestInfo,
        ignore_protocol: bool,
    ) -> Result<Arc<dyn Converter>, ConverterError> {
        let candidates = self.converters()?.iter().filter_map(|converter| {
            let level = converter.can_convert_to(expected, request);
            let qualifies =
                level.has_type_match() && (ignore_protocol || level.has_protocol_match());
            let level = if ignore_protocol {
                level.without_protocol()
            } else {
                level
            };
            qualifies.then_some((level, converter))
        });

        let selected = Self::select(candidates, expected);
        if let Some(converter) = &selected {
            tracing::debug!(
                converter = converter.name(),
                expected = %expected,
                content_type = request.content_type().unwrap_or("<none>"),
                "selected input converter"
            );
        }

        selected.ok_or_else(|| ConverterError::NoInputConverter {
            type_name: expected.to_string(),
            content_type: request.content_type().unwrap_or("<none>").to_string(),
        })
    }

    /// Finds the converter that best writes `given` into `response`.
    ///
    /// Both the protocol and type bits must be set. When nothing qualifies
    /// and the originating request accepts any format, converters that can
    /// read the request's own media type are considered instead.
    pub fn find_best_output_converter(
        &self,
        given: &TypeDescriptor,
        response: &ResponseInfo,
    ) -> Result<Arc<dyn Converter>, ConverterError> {
        let converters = self.converters()?;
        let candidates = converters.iter().filter_map(|converter| {
            let level = converter.can_convert_from(given, response);
            (level.has_protocol_match() && level.has_type_match()).then_some((level, converter))
        });

        let mut selected = Self::select(candidates, given);
        let request = response.request();
        if selected.is_none() && request.is_output_neutral() {
            let fallback = converters.iter().filter_map(|converter| {
                let level = converter.can_convert_to(given, request);
                level.has_protocol_match().then_some((level, converter))
            });
            selected = Self::select(fallback, given);
        }

        if let Some(converter) = &selected {
            tracing::debug!(
                converter = converter.name(),
                given = %given,
                accept = request.accept().unwrap_or("<none>"),
                "selected output converter"
            );
        }

        selected.ok_or_else(|| ConverterError::NoOutputConverter {
            type_name: given.to_string(),
            accept: request.accept().unwrap_or("<none>").to_string(),
        })
    }

    /// Orders by level descending, then prefers non-text converters for
    /// non-text items; registration order breaks remaining ties.
    fn select<'a>(
        candidates: impl Iterator<Item = (CompatibilityLevel, &'a Arc<dyn Converter>)>,
        value_type: &TypeDescriptor,
    ) -> Option<Arc<dyn Converter>> {
        let wants_string = value_type.is_string_item();
        let mut ranked: Vec<_> = candidates.collect();
        ranked.sort_by(|(left_level, left), (right_level, right)| {
            right_level.cmp(left_level).then_with(|| {
                let penalty = |c: &Arc<dyn Converter>| !wants_string && c.targets_string();
                penalty(left).cmp(&penalty(right))
            })
        });
        ranked.first().map(|(_, converter)| Arc::clone(converter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use hypatia_url::UrlParserRegistry;

    fn request(content_type: Option<&str>, accept: Option<&str>) -> RequestInfo {
        let url = UrlParserRegistry::with_defaults().parse("/api/test").unwrap();
        let mut request = RequestInfo::new(Method::POST, url);
        if let Some(content_type) = content_type {
            request = request.with_header("content-type", content_type);
        }
        if let Some(accept) = accept {
            request = request.with_header("accept", accept);
        }
        request
    }

    fn provider() -> ConverterProvider {
        ConverterProvider::with_converters(vec![Arc::new(TextConverter), Arc::new(JsonConverter)])
    }

    #[test]
    fn test_uninitialized_provider_fails() {
        let provider = ConverterProvider::new();
        let err = provider
            .find_best_input_converter(&TypeDescriptor::integer(), &request(None, None), false)
            .unwrap_err();
        assert_eq!(err, ConverterError::NotInitialized);
    }

    #[test]
    fn test_initialize_twice_fails() {
        let provider = provider();
        assert_eq!(
            provider.initialize(Vec::new()),
            Err(ConverterError::AlreadyInitialized)
        );
    }

    #[test]
    fn test_exact_match_beats_type_match() {
        let provider = provider();
        let request = request(Some("text/plain"), None);
        let converter = provider
            .find_best_input_converter(&TypeDescriptor::string(), &request, false)
            .unwrap();
        assert_eq!(converter.name(), "text");
    }

    #[test]
    fn test_non_string_converter_preferred_among_equals() {
        let provider = provider();
        let converter = provider
            .find_best_input_converter(&TypeDescriptor::integer(), &request(None, None), false)
            .unwrap();
        assert_eq!(converter.name(), "json");
    }

    #[test]
    fn test_complex_collections_use_json() {
        let provider = provider();
        let converter = provider
            .find_best_input_converter(
                &TypeDescriptor::array(TypeDescriptor::object("Person")),
                &request(None, None),
                false,
            )
            .unwrap();
        assert_eq!(converter.name(), "json");
    }

    #[test]
    fn test_protocol_mismatch_is_rejected_unless_ignored() {
        let provider = provider();
        let request = request(Some("application/json"), None);

        let selected = provider
            .find_best_input_converter(&TypeDescriptor::boolean(), &request, false)
            .unwrap();
        assert_eq!(selected.name(), "json");

        let ignoring = provider
            .find_best_input_converter(&TypeDescriptor::string(), &request, true)
            .unwrap();
        // protocol ignored: text's exact type match wins
        assert_eq!(ignoring.name(), "text");
    }

    #[test]
    fn test_no_input_converter() {
        let provider = provider();
        let err = provider
            .find_best_input_converter(
                &TypeDescriptor::object("Person"),
                &request(Some("image/png"), None),
                false,
            )
            .unwrap_err();
        assert!(matches!(err, ConverterError::NoInputConverter { .. }));
    }

    #[test]
    fn test_output_converter_follows_accept() {
        let provider = provider();
        let response = ResponseInfo::new(Arc::new(request(None, Some("text/plain"))));
        let converter = provider
            .find_best_output_converter(&TypeDescriptor::integer(), &response)
            .unwrap();
        assert_eq!(converter.name(), "text");
    }

    #[test]
    fn test_output_converter_not_acceptable() {
        let provider = provider();
        let response = ResponseInfo::new(Arc::new(request(None, Some("image/png"))));
        let err = provider
            .find_best_output_converter(&TypeDescriptor::integer(), &response)
            .unwrap_err();
        assert!(matches!(err, ConverterError::NoOutputConverter { .. }));
    }

    #[test]
    fn test_converter_by_name() {
        assert_eq!(converter_by_name("JSON").unwrap().name(), "json");
        assert!(matches!(
            converter_by_name("xml"),
            Err(ConverterError::UnknownConverter(_))
        ));
    }
}
