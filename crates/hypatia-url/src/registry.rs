//! Scheme to parser registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{UrlError, UrlResult};
use crate::parser::{FtpUrlParser, HttpUrlParser, UrlParser, UrnParser};
use crate::url::Url;

/// Maps schemes to parsers.
///
/// The registry is an ordinary value owned by the application's composition
/// root and shared by reference; there is no process-wide instance. At most
/// one parser is kept per scheme, the last registration wins. The most recently
/// registered parser that allows relative addresses handles schemeless input.
///
/// # Example
///
/// ```rust
/// use hypatia_url::{UrlError, UrlParserRegistry};
///
/// let registry = UrlParserRegistry::with_defaults();
///
/// assert!(registry.parse("https://example.com/a").unwrap().is_absolute());
/// assert!(!registry.parse("/a/b?c=d").unwrap().is_absolute());
///
/// assert_eq!(registry.create_for("").unwrap_err(), UrlError::EmptyScheme);
/// assert!(registry.create_for("gopher").unwrap_err().is_out_of_range());
/// ```
#[derive(Debug, Clone, Default)]
pub struct UrlParserRegistry {
    parsers: HashMap<String, Arc<dyn UrlParser>>,
    relative: Option<Arc<dyn UrlParser>>,
}

impl UrlParserRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the `http`, `ftp` and `urn` parsers.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register::<HttpUrlParser>()
            .register::<FtpUrlParser>()
            .register::<UrnParser>();
        registry
    }

    /// Creates a registry from built-in parser names (`http`, `ftp`, `urn`).
    pub fn from_names<I, S>(names: I) -> UrlResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for name in names {
            let parser: Arc<dyn UrlParser> = match name.as_ref().to_ascii_lowercase().as_str() {
                "http" => Arc::new(HttpUrlParser),
                "ftp" => Arc::new(FtpUrlParser),
                "urn" => Arc::new(UrnParser),
                other => {
                    return Err(UrlError::UnknownParser {
                        name: other.to_string(),
                    })
                }
            };
            registry.register_parser(parser);
        }
        Ok(registry)
    }

    /// Registers a default-constructed parser.
    pub fn register<P>(&mut self) -> &mut Self
    where
        P: UrlParser + Default + 'static,
    {
        self.register_parser(Arc::new(P::default()))
    }

    /// Registers a parser instance under each of its schemes.
    pub fn register_parser(&mut self, parser: Arc<dyn UrlParser>) -> &mut Self {
        for scheme in parser.schemes() {
            let scheme = scheme.to_ascii_lowercase();
            if self
                .parsers
                .insert(scheme.clone(), Arc::clone(&parser))
                .is_some()
            {
                tracing::debug!(scheme = %scheme, "replacing registered URL parser");
            }
        }

        if parser.allows_relative_addresses() {
            self.relative = Some(parser);
        }

        self
    }

    /// Resolves the parser registered for a scheme.
    ///
    /// # Errors
    ///
    /// [`UrlError::EmptyScheme`] for an empty scheme and
    /// [`UrlError::UnknownScheme`] when nothing is registered for it.
    pub fn create_for(&self, scheme: &str) -> UrlResult<Arc<dyn UrlParser>> {
        if scheme.is_empty() {
            return Err(UrlError::EmptyScheme);
        }

        self.parsers
            .get(&scheme.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| UrlError::UnknownScheme {
                scheme: scheme.to_string(),
            })
    }

    /// Parses a URL by dispatching on its scheme prefix.
    ///
    /// Input without a scheme goes to the relative-capable parser.
    pub fn parse(&self, url: &str) -> UrlResult<Url> {
        match scheme_of(url)? {
            Some(scheme) => self.create_for(scheme)?.parse(url),
            None => match &self.relative {
                Some(parser) => parser.parse_relative(url),
                None => Err(UrlError::RelativeNotSupported {
                    url: url.to_string(),
                }),
            },
        }
    }

    /// Returns the registered schemes.
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }

    /// Returns `true` if schemeless input can be parsed.
    #[must_use]
    pub fn accepts_relative(&self) -> bool {
        self.relative.is_some()
    }
}

/// Returns the scheme prefix of `url`, if it has one.
///
/// A scheme is `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )` followed by `:`
/// before any `/`, `?` or `#`. A leading `:` is always malformed.
fn scheme_of(url: &str) -> UrlResult<Option<&str>> {
    let Some(index) = url.find(':') else {
        return Ok(None);
    };
    if index == 0 {
        return Err(UrlError::malformed(url, "':' at position 0"));
    }

    let candidate = &url[..index];
    let mut characters = candidate.chars();
    let starts_with_letter = characters
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic());
    let valid = starts_with_letter
        && characters.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    if valid {
        Ok(Some(candidate))
    } else if candidate.contains(|c| matches!(c, '/' | '?' | '#')) {
        Ok(None)
    } else {
        Err(UrlError::malformed(url, format!("invalid scheme '{candidate}'")))
    }
}
