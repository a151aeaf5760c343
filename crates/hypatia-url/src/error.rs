//! URL error types.

use thiserror::Error;

/// Result type alias using [`UrlError`].
pub type UrlResult<T> = Result<T, UrlError>;

/// Errors raised while resolving parsers or parsing URLs.
///
/// `EmptyScheme` is an argument error while `UnknownScheme` is an
/// out-of-range error; callers are expected to tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    /// An empty scheme was passed where a scheme is required.
    #[error("scheme must not be empty")]
    EmptyScheme,

    /// No parser is registered for the scheme.
    #[error("no URL parser registered for scheme '{scheme}'")]
    UnknownScheme {
        /// The scheme that was looked up.
        scheme: String,
    },

    /// The input has no scheme and no parser accepts relative addresses.
    #[error("'{url}' is not absolute and no parser accepts relative addresses")]
    RelativeNotSupported {
        /// The offending input.
        url: String,
    },

    /// The input could not be parsed.
    #[error("malformed URL '{url}': {reason}")]
    Malformed {
        /// The offending input.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// A configured parser name does not map to a built-in parser.
    #[error("unknown URL parser '{name}'")]
    UnknownParser {
        /// The configured name.
        name: String,
    },
}

impl UrlError {
    /// Creates a malformed URL error.
    #[must_use]
    pub fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for argument errors (invalid input to the call itself).
    #[must_use]
    pub const fn is_argument_error(&self) -> bool {
        matches!(self, Self::EmptyScheme)
    }

    /// Returns `true` when the lookup key was valid but nothing is registered for it.
    #[must_use]
    pub const fn is_out_of_range(&self) -> bool {
        matches!(self, Self::UnknownScheme { .. } | Self::UnknownParser { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_unknown_scheme_are_distinct() {
        let empty = UrlError::EmptyScheme;
        let unknown = UrlError::UnknownScheme {
            scheme: "gopher".to_string(),
        };

        assert!(empty.is_argument_error());
        assert!(!empty.is_out_of_range());
        assert!(unknown.is_out_of_range());
        assert!(!unknown.is_argument_error());
        assert!(unknown.to_string().contains("gopher"));
    }

    #[test]
    fn test_malformed_message() {
        let err = UrlError::malformed(":foo", "':' at position 0");
        assert!(err.to_string().contains(":foo"));
        assert!(err.to_string().contains("position 0"));
    }
}
