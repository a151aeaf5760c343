//! Named text fields decomposed from form-shaped bodies.
//!
//! Both `application/x-www-form-urlencoded` and `multipart/form-data`
//! bodies reduce to [`FormFields`]: an ordered list of name/value pairs.

use crate::error::{BindingError, BindingSource};

/// Media type of URL-encoded forms.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Ordered name/value pairs from a form body.
///
/// ```rust
/// use hypatia_extract::FormFields;
///
/// let fields = FormFields::from_urlencoded(b"name=Ada+Lovelace&tag=a&tag=b").unwrap();
/// assert_eq!(fields.get_all("NAME"), vec!["Ada Lovelace"]);
/// assert_eq!(fields.get_all("tag"), vec!["a", "b"]);
/// assert_eq!(fields.at(1), Some("a"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    fields: Vec<(String, String)>,
}

impl FormFields {
    /// Creates an empty field list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a URL-encoded body.
    pub fn from_urlencoded(body: &[u8]) -> Result<Self, BindingError> {
        serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
            .map(|fields| Self { fields })
            .map_err(|e| BindingError::malformed(BindingSource::Body, e))
    }

    /// Appends a field.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Returns every value of the fields called `name`, ignoring case.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Returns the value of the field at `index`.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|(_, value)| value.as_str())
    }

    /// Returns the values for the body parameter `peers[index]`.
    ///
    /// Fields named after the parameter win. Otherwise the parameter takes
    /// the field whose rank among the fields no peer names equals its rank
    /// among the peers no field names.
    #[must_use]
    pub fn values_for(&self, peers: &[&str], index: usize) -> Vec<&str> {
        let Some(name) = peers.get(index) else {
            return Vec::new();
        };
        let named = self.get_all(name);
        if !named.is_empty() {
            return named;
        }

        let slot = peers[..index]
            .iter()
            .filter(|peer| !self.has(peer))
            .count();
        self.fields
            .iter()
            .filter(|(field, _)| !peers.iter().any(|peer| field.eq_ignore_ascii_case(peer)))
            .nth(slot)
            .map(|(_, value)| value.as_str())
            .into_iter()
            .collect()
    }

    fn has(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| field.eq_ignore_ascii_case(name))
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over the fields in body order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl FromIterator<(String, String)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
