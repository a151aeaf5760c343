use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use super::Converter;
use crate::compat::CompatibilityLevel;
use crate::error::ConversionError;
use crate::request::{accepts_media_type, media_type_essence, RequestInfo};
use crate::response::ResponseInfo;
use crate::types::TypeDescriptor;

const APPLICATION_JSON: &str = "application/json";

/// Reads and writes `application/json` bodies.
///
/// Structured types are its exact match; scalars are accepted too.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonConverter;

impl JsonConverter {
    fn type_level(value_type: &TypeDescriptor) -> CompatibilityLevel {
        match value_type.non_optional() {
            TypeDescriptor::Object(_)
            | TypeDescriptor::Array(_)
            | TypeDescriptor::Tuple(_)
            | TypeDescriptor::Any => CompatibilityLevel::EXACT_TYPE_MATCH,
            _ => CompatibilityLevel::TYPE_MATCH,
        }
    }

    fn is_json(media_type: &str) -> bool {
        media_type == APPLICATION_JSON || media_type.ends_with("+json")
    }
}

#[async_trait]
impl Converter for JsonConverter {
    fn name(&self) -> &str {
        "json"
    }

    fn media_types(&self) -> &[&str] {
        &[APPLICATION_JSON]
    }

    fn can_convert_to(&self, expected: &TypeDescriptor, request: &RequestInfo) -> CompatibilityLevel {
        let protocol = match request.content_type().map(media_type_essence) {
            None => CompatibilityLevel::PROTOCOL_MATCH,
            Some(Some(essence)) if Self::is_json(&essence) => {
                CompatibilityLevel::EXACT_PROTOCOL_MATCH
            }
            Some(_) => CompatibilityLevel::NONE,
        };
        CompatibilityLevel::combine(protocol, Self::type_level(expected))
    }

    fn can_convert_from(&self, given: &TypeDescriptor, response: &ResponseInfo) -> CompatibilityLevel {
        let protocol = match response.request().accept() {
            None => CompatibilityLevel::PROTOCOL_MATCH,
            Some(accept) if accepts_media_type(accept, APPLICATION_JSON) => {
                CompatibilityLevel::EXACT_PROTOCOL_MATCH
            }
            Some(accept)
                if accepts_media_type(accept, "*/*")
                    || accepts_media_type(accept, "application/*") =>
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
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        let value: Value =
            serde_json::from_slice(body).map_err(|source| ConversionError::Payload {
                media_type: APPLICATION_JSON,
                source,
            })?;

        if expected.accepts(&value) || value.is_null() {
            Ok(value)
        } else {
            Err(ConversionError::invalid(
                expected.to_string(),
                String::from_utf8_lossy(body).into_owned(),
            ))
        }
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

        let body = serde_json::to_vec(value).map_err(ConversionError::Serialize)?;
        response.write_body(Bytes::from(body), APPLICATION_JSON);
        Ok(())
    }
}
