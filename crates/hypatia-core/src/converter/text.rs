use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use super::Converter;
use crate::compat::CompatibilityLevel;
use crate::error::ConversionError;
use crate::request::{accepts_media_type, media_type_essence, RequestInfo};
use crate::response::ResponseInfo;
use crate::types::TypeDescriptor;

const TEXT_PLAIN: &str = "text/plain";

/// Reads and writes `text/plain` bodies holding a single scalar.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextConverter;

impl TextConverter {
    fn type_level(value_type: &TypeDescriptor) -> CompatibilityLevel {
        match value_type.non_optional() {
            TypeDescriptor::String => CompatibilityLevel::EXACT_TYPE_MATCH,
            other if other.is_primitive() => CompatibilityLevel::TYPE_MATCH,
            _ => CompatibilityLevel::NONE,
        }
    }
}

#[async_trait]
impl Converter for TextConverter {
    fn name(&self) -> &str {
        "text"
    }

    fn media_types(&self) -> &[&str] {
        &[TEXT_PLAIN]
    }

    fn targets_string(&self) -> bool {
        true
    }

    fn can_convert_to(&self, expected: &TypeDescriptor, request: &RequestInfo) -> CompatibilityLevel {
        let protocol = match request.content_type().map(media_type_essence) {
            None => CompatibilityLevel::PROTOCOL_MATCH,
            Some(Some(essence)) if essence == TEXT_PLAIN => CompatibilityLevel::EXACT_PROTOCOL_MATCH,
            Some(_) => CompatibilityLevel::NONE,
        };
        CompatibilityLevel::combine(protocol, Self::type_level(expected))
    }

    fn can_convert_from(&self, given: &TypeDescriptor, response: &ResponseInfo) -> CompatibilityLevel {
        let protocol = match response.request().accept() {
            None => CompatibilityLevel::PROTOCOL_MATCH,
            Some(accept) if accepts_media_type(accept, TEXT_PLAIN) => {
                CompatibilityLevel::EXACT_PROTOCOL_MATCH
            }
            Some(accept)
                if accepts_media_type(accept, "*/*") || accepts_media_type(accept, "text/*") =>
            {
                CompatibilityLevel::PROTOCOL_MATCH
            }
            Some(_) => CompatibilityLevel::NONE,
        };
        CompatibilityLevel::combine(protocol, Self::type_level(given))
    }

    async fn convert_to(
        &self,
        expected: &TypeDescriptor,
        body: &Bytes,
        request: &RequestInfo,
    ) -> Result<Value, ConversionError> {
        if request.cancellation().is_cancelled() {
            return Err(ConversionError::Cancelled);
        }

        let text = std::str::from_utf8(body)?;
        if text.is_empty() && !expected.non_optional().eq(&TypeDescriptor::String) {
            return Ok(Value::Null);
        }
        expected.convert_text(text)
    }

    async fn convert_from(
        &self,
        _given: &TypeDescriptor,
        value: &Value,
        response: &mut ResponseInfo,
    ) -> Result<(), ConversionError> {
        if response.request().cancellation().is_cancelled() {
            return Err(ConversionError::Cancelled);
        }

        let text = match value {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        response.write_body(Bytes::from(text), "text/plain; charset=utf-8");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use hypatia_url::UrlParserRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn request(content_type: Option<&str>) -> RequestInfo {
        let url = UrlParserRegistry::with_defaults().parse("/api/test").unwrap();
        let request = RequestInfo::new(Method::POST, url);
        match content_type {
            Some(value) => request.with_header("content-type", value),
            None => request,
        }
    }

    #[test]
    fn test_type_levels() {
        let request = request(Some("text/plain"));
        assert_eq!(
            TextConverter.can_convert_to(&TypeDescriptor::string(), &request),
            CompatibilityLevel::EXACT_MATCH
        );
        assert_eq!(
            TextConverter.can_convert_to(&TypeDescriptor::integer(), &request),
            CompatibilityLevel::EXACT_PROTOCOL_MATCH | CompatibilityLevel::TYPE_MATCH
        );
        assert!(TextConverter
            .can_convert_to(&TypeDescriptor::object("Person"), &request)
            .is_none());
    }

    #[tokio::test]
    async fn test_convert_to_scalar() {
        let value = TextConverter
            .convert_to(
                &TypeDescriptor::integer(),
                &Bytes::from_static(b" 12 "),
                &request(None),
            )
            .await
            .unwrap();
        assert_eq!(value, json!(12));
    }

    #[tokio::test]
    async fn test_convert_to_keeps_text_verbatim() {
        let value = TextConverter
            .convert_to(
                &TypeDescriptor::string(),
                &Bytes::from_static(b" padded "),
                &request(None),
            )
            .await
            .unwrap();
        assert_eq!(value, json!(" padded "));
    }

    #[tokio::test]
    async fn test_convert_from_writes_raw_text() {
        let mut response = ResponseInfo::new(Arc::new(request(None)));
        TextConverter
            .convert_from(&TypeDescriptor::string(), &json!("hello"), &mut response)
            .await
            .unwrap();
        assert_eq!(&response.body()[..], b"hello");
        assert_eq!(
            response.header("content-type"),
            Some("text/plain; charset=utf-8")
        );
    }
}
