//! Route variable values captured from a matched URL.

use smallvec::SmallVec;

/// Routes rarely carry more than a handful of variables.
const INLINE_VALUES: usize = 4;

/// Decoded values of route template variables, in template order.
///
/// Lookup by name is ASCII case-insensitive, like route matching itself.
///
/// # Example
///
/// ```rust
/// use hypatia_router::RouteValues;
///
/// let mut values = RouteValues::new();
/// values.push("personId", "7");
/// values.push("id", "Jan Kowalski");
///
/// assert_eq!(values.get("PERSONID"), Some("7"));
/// assert_eq!(values.at(1), Some("Jan Kowalski"));
/// assert_eq!(values.get("unknown"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteValues {
    inner: SmallVec<[(String, String); INLINE_VALUES]>,
}

impl RouteValues {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the first value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value at template position `index`.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&str> {
        self.inner.get(index).map(|(_, v)| v.as_str())
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captured values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for RouteValues {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}
