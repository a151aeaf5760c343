//! Declared types of operation parameters and results.
//!
//! Operations exchange [`serde_json::Value`]s; a [`TypeDescriptor`] states
//! which shape a value is expected to have. Descriptors drive default
//! parameter sources, converter selection and text conversion for URL and
//! query values.

use std::fmt;

use serde_json::{Number, Value};
use uuid::Uuid;

use crate::error::ConversionError;

/// The declared type of a parameter or result.
///
/// # Example
///
/// ```
/// use hypatia_core::TypeDescriptor;
/// use serde_json::json;
///
/// let ids = TypeDescriptor::array(TypeDescriptor::integer());
/// assert!(ids.is_primitive_collection());
/// assert_eq!(ids.item_type(), &TypeDescriptor::integer());
/// assert_eq!(ids.convert_texts(&["1", "2"]).unwrap(), json!([1, 2]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// No value.
    Unit,
    /// `true` / `false`.
    Boolean,
    /// Signed 64-bit integer.
    Integer,
    /// Floating point number.
    Number,
    /// UTF-8 text.
    String,
    /// A UUID, carried as its hyphenated text.
    Guid,
    /// A named complex type.
    Object(String),
    /// A homogeneous collection.
    Array(Box<TypeDescriptor>),
    /// A value that may be `null`.
    Optional(Box<TypeDescriptor>),
    /// Several values written as one multi-object body.
    Tuple(Vec<TypeDescriptor>),
    /// Any JSON value.
    Any,
}

impl TypeDescriptor {
    /// `string`
    #[must_use]
    pub const fn string() -> Self {
        Self::String
    }

    /// `integer`
    #[must_use]
    pub const fn integer() -> Self {
        Self::Integer
    }

    /// `number`
    #[must_use]
    pub const fn number() -> Self {
        Self::Number
    }

    /// `boolean`
    #[must_use]
    pub const fn boolean() -> Self {
        Self::Boolean
    }

    /// `guid`
    #[must_use]
    pub const fn guid() -> Self {
        Self::Guid
    }

    /// `unit`
    #[must_use]
    pub const fn unit() -> Self {
        Self::Unit
    }

    /// A named complex type.
    #[must_use]
    pub fn object(name: impl Into<String>) -> Self {
        Self::Object(name.into())
    }

    /// A collection of `item`.
    #[must_use]
    pub fn array(item: TypeDescriptor) -> Self {
        Self::Array(Box::new(item))
    }

    /// An optional `inner`.
    #[must_use]
    pub fn optional(inner: TypeDescriptor) -> Self {
        match inner {
            Self::Optional(_) => inner,
            other => Self::Optional(Box::new(other)),
        }
    }

    /// Strips any [`Optional`](Self::Optional) wrapper.
    #[must_use]
    pub fn non_optional(&self) -> &TypeDescriptor {
        match self {
            Self::Optional(inner) => inner.non_optional(),
            other => other,
        }
    }

    /// Returns `true` for optional types.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Returns `true` for [`Unit`](Self::Unit).
    #[must_use]
    pub fn is_unit(&self) -> bool {
        matches!(self.non_optional(), Self::Unit)
    }

    /// Returns `true` for scalar types that convert from text.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self.non_optional(),
            Self::Boolean | Self::Integer | Self::Number | Self::String | Self::Guid
        )
    }

    /// Returns `true` for collections of primitives.
    #[must_use]
    pub fn is_primitive_collection(&self) -> bool {
        matches!(self.non_optional(), Self::Array(item) if item.is_primitive())
    }

    /// Returns `true` for types exchanged as structured documents.
    #[must_use]
    pub fn is_complex(&self) -> bool {
        matches!(
            self.non_optional(),
            Self::Object(_) | Self::Tuple(_) | Self::Any
        ) || matches!(self.non_optional(), Self::Array(item) if !item.is_primitive())
    }

    /// Returns `true` for integer and GUID types, the types identifiers use.
    #[must_use]
    pub fn is_identifier_like(&self) -> bool {
        matches!(self.non_optional(), Self::Integer | Self::Guid)
    }

    /// Returns the element type of a collection, otherwise the type itself.
    #[must_use]
    pub fn item_type(&self) -> &TypeDescriptor {
        match self.non_optional() {
            Self::Array(item) => item.non_optional(),
            other => other,
        }
    }

    /// Returns `true` when the item type is text.
    #[must_use]
    pub fn is_string_item(&self) -> bool {
        matches!(self.item_type(), Self::String)
    }

    /// Converts a single decoded text value to this type.
    pub fn convert_text(&self, text: &str) -> Result<Value, ConversionError> {
        match self.non_optional() {
            Self::String => Ok(Value::String(text.to_string())),
            Self::Boolean => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(ConversionError::invalid("boolean", text)),
            },
            Self::Integer => text
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| ConversionError::invalid("integer", text)),
            Self::Number => text
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| ConversionError::invalid("number", text)),
            Self::Guid => Uuid::parse_str(text.trim())
                .map(|uuid| Value::String(uuid.hyphenated().to_string()))
                .map_err(|_| ConversionError::invalid("guid", text)),
            Self::Array(item) => Ok(Value::Array(vec![item.convert_text(text)?])),
            Self::Unit => Ok(Value::Null),
            Self::Any => {
                Ok(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
            }
            Self::Object(_) | Self::Tuple(_) => serde_json::from_str(text).map_err(|source| {
                ConversionError::Payload {
                    media_type: "application/json",
                    source,
                }
            }),
            Self::Optional(inner) => inner.convert_text(text),
        }
    }

    /// Converts repeated text values; collections take all of them, scalars
    /// the first.
    pub fn convert_texts(&self, texts: &[&str]) -> Result<Value, ConversionError> {
        match self.non_optional() {
            Self::Array(item) => texts
                .iter()
                .map(|text| item.convert_text(text))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => match texts.first() {
                Some(text) => self.convert_text(text),
                None => Ok(Value::Null),
            },
        }
    }

    /// Returns `true` if `value` has this type's shape.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Optional(_) | Self::Unit | Self::Any, Value::Null) => true,
            (Self::Optional(inner), value) => inner.accepts(value),
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::Integer, Value::Number(number)) => number.is_i64() || number.is_u64(),
            (Self::Number, Value::Number(_)) => true,
            (Self::String, Value::String(_)) => true,
            (Self::Guid, Value::String(text)) => Uuid::parse_str(text).is_ok(),
            (Self::Array(item), Value::Array(values)) => values.iter().all(|v| item.accepts(v)),
            (Self::Tuple(items), Value::Array(values)) => {
                items.len() == values.len() && items.iter().zip(values).all(|(t, v)| t.accepts(v))
            }
            (Self::Object(_), Value::Object(_)) | (Self::Any, _) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("unit"),
            Self::Boolean => f.write_str("boolean"),
            Self::Integer => f.write_str("integer"),
            Self::Number => f.write_str("number"),
            Self::String => f.write_str("string"),
            Self::Guid => f.write_str("guid"),
            Self::Object(name) => f.write_str(name),
            Self::Array(item) => write!(f, "array<{item}>"),
            Self::Optional(inner) => write!(f, "optional<{inner}>"),
            Self::Tuple(items) => {
                f.write_str("(")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            Self::Any => f.write_str("any"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classification() {
        assert!(TypeDescriptor::integer().is_primitive());
        assert!(TypeDescriptor::optional(TypeDescriptor::guid()).is_primitive());
        assert!(TypeDescriptor::object("Person").is_complex());
        assert!(TypeDescriptor::array(TypeDescriptor::object("Person")).is_complex());
        assert!(!TypeDescriptor::array(TypeDescriptor::string()).is_complex());
        assert!(TypeDescriptor::optional(TypeDescriptor::integer()).is_identifier_like());
        assert!(!TypeDescriptor::string().is_identifier_like());
    }

    #[test]
    fn test_optional_does_not_nest() {
        let once = TypeDescriptor::optional(TypeDescriptor::integer());
        let twice = TypeDescriptor::optional(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_item_type() {
        let strings = TypeDescriptor::array(TypeDescriptor::string());
        assert!(strings.is_string_item());
        assert_eq!(TypeDescriptor::integer().item_type(), &TypeDescriptor::Integer);
    }

    #[test]
    fn test_convert_text() {
        assert_eq!(TypeDescriptor::integer().convert_text("42").unwrap(), json!(42));
        assert_eq!(TypeDescriptor::number().convert_text("2.5").unwrap(), json!(2.5));
        assert_eq!(TypeDescriptor::boolean().convert_text("TRUE").unwrap(), json!(true));
        assert_eq!(
            TypeDescriptor::guid()
                .convert_text("6E8BC430-9C3A-11D9-9669-0800200C9A66")
                .unwrap(),
            json!("6e8bc430-9c3a-11d9-9669-0800200c9a66")
        );
        assert_eq!(
            TypeDescriptor::object("Point").convert_text(r#"{"x":1}"#).unwrap(),
            json!({"x": 1})
        );
    }

    #[test]
    fn test_convert_text_failures() {
        assert!(TypeDescriptor::integer().convert_text("4.2").is_err());
        assert!(TypeDescriptor::boolean().convert_text("yes").is_err());
        assert!(TypeDescriptor::guid().convert_text("not-a-guid").is_err());
        assert!(TypeDescriptor::number().convert_text("NaN").is_err());
    }

    #[test]
    fn test_convert_texts() {
        let tags = TypeDescriptor::array(TypeDescriptor::string());
        assert_eq!(tags.convert_texts(&["a", "b"]).unwrap(), json!(["a", "b"]));
        assert_eq!(TypeDescriptor::integer().convert_texts(&["1", "2"]).unwrap(), json!(1));
        assert_eq!(TypeDescriptor::integer().convert_texts(&[]).unwrap(), Value::Null);
    }

    #[test]
    fn test_accepts() {
        assert!(TypeDescriptor::integer().accepts(&json!(3)));
        assert!(!TypeDescriptor::integer().accepts(&json!(3.5)));
        assert!(TypeDescriptor::optional(TypeDescriptor::boolean()).accepts(&Value::Null));
        assert!(!TypeDescriptor::boolean().accepts(&Value::Null));
        let pair = TypeDescriptor::Tuple(vec![TypeDescriptor::integer(), TypeDescriptor::string()]);
        assert!(pair.accepts(&json!([1, "a"])));
        assert!(!pair.accepts(&json!([1])));
    }

    #[test]
    fn test_display() {
        let ty = TypeDescriptor::optional(TypeDescriptor::array(TypeDescriptor::object("Person")));
        assert_eq!(ty.to_string(), "optional<array<Person>>");
    }
}
