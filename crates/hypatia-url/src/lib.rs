//! # Hypatia URL
//!
//! Scheme-aware URL model for the Hypatia REST framework.
//!
//! - [`Url`] - immutable parsed URL (`http`, `ftp`, relative, opaque)
//! - [`UrlParser`] - per-scheme parser trait with built-in implementations
//! - [`UrlParserRegistry`] - explicit scheme to parser registry
//! - [`chars`] - RFC 1738 character classes and [`chars::to_safe_string`]
//!
//! ## Example
//!
//! ```rust
//! use hypatia_url::{chars, UrlParserRegistry};
//!
//! let registry = UrlParserRegistry::with_defaults();
//! let url = registry.parse("http://example.com/api/people").unwrap();
//! let person = url.add_segment("Jan Kowalski");
//!
//! assert_eq!(person.to_string(), "http://example.com/api/people/Jan%20Kowalski");
//! assert_eq!(registry.parse(&person.to_string()).unwrap(), person);
//! assert_eq!(chars::to_safe_string("a;b", chars::UNRESERVED), "a%3Bb");
//! ```

#![doc(html_root_url = "https://docs.rs/hypatia-url/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chars;
mod error;
mod parser;
mod registry;
mod url;

pub use error::{UrlError, UrlResult};
pub use parser::{FtpUrlParser, HttpUrlParser, UrlParser, UrnParser};
pub use registry::UrlParserRegistry;
pub use url::{FtpUrl, GenericUrl, HttpUrl, QueryParameters, RelativeUrl, Url};
