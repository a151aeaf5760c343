//! Argument binding for Hypatia operations.
//!
//! Given a mapped operation and its request, [`ArgumentBinder`] produces the
//! [`Arguments`](hypatia_core::Arguments) the controller is invoked with.
//! Each parameter is read by the [`ValueBinder`] registered for its source:
//!
//! | Source | Binder | Reads |
//! |--------|--------|-------|
//! | `Url` | [`UrlBinder`] | path variables captured by the route template |
//! | `Query` | [`QueryBinder`] | query parameters, names ignoring case |
//! | `Header(name)` | [`HeaderBinder`] | the named request header |
//! | `Body` | [`BodyBinder`] | form fields, multipart parts or a converted payload |
//!
//! URL, query and header values are text and convert straight to the
//! declared type. Only non-form bodies go through the
//! [`ConverterProvider`](hypatia_core::ConverterProvider).

#![doc(html_root_url = "https://docs.rs/hypatia-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
mod context;
mod error;
mod form;
mod limits;
mod multipart;

pub use binder::{ArgumentBinder, BodyBinder, HeaderBinder, Position, QueryBinder, UrlBinder, ValueBinder};
pub use context::{BindingContext, BodyContent};
pub use error::{BindingError, BindingSource};
pub use form::{FormFields, FORM_URLENCODED};
pub use limits::{BindingLimits, DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_MULTIPART_FIELDS};
pub use multipart::{read_multipart, MULTIPART_FORM_DATA};
