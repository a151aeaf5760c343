//! # Hypatia Core
//!
//! Core types and traits for the Hypatia REST framework.
//!
//! - [`RequestInfo`] / [`ResponseInfo`] - the request being served and the response under construction
//! - [`RequestId`] - UUID v7 request identifier
//! - [`CancellationSignal`] - per-request cancellation shared with body reads and converters
//! - [`TypeDescriptor`] - declared parameter and result types
//! - [`CompatibilityLevel`] - converter ranking lattice
//! - [`ConverterProvider`] - body codec selection over [`Converter`]s
//! - [`ControllerMetadata`] - static per-controller method table
//! - [`Controller`] / [`ControllerActivator`] - operation invocation and controller creation
//! - [`ErrorCategory`] - error classification shared by every pipeline stage
//!
//! ## Example
//!
//! ```rust
//! use hypatia_core::{ConverterProvider, JsonConverter, RequestInfo, TextConverter, TypeDescriptor};
//! use hypatia_url::UrlParserRegistry;
//! use std::sync::Arc;
//!
//! let provider = ConverterProvider::with_converters(vec![
//!     Arc::new(JsonConverter),
//!     Arc::new(TextConverter),
//! ]);
//!
//! let url = UrlParserRegistry::with_defaults().parse("/api/person").unwrap();
//! let request = RequestInfo::new(http::Method::POST, url).with_header("content-type", "application/json");
//!
//! let converter = provider
//!     .find_best_input_converter(&TypeDescriptor::object("Person"), &request, false)
//!     .unwrap();
//! assert_eq!(converter.name(), "json");
//! ```

#![doc(html_root_url = "https://docs.rs/hypatia-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod activator;
mod compat;
mod context;
mod controller;
pub mod converter;
pub mod crud;
mod error;
pub mod fixtures;
mod metadata;
mod request;
mod response;
mod types;

pub use activator::{ControllerActivator, ControllerFactories};
pub use compat::CompatibilityLevel;
pub use context::{CancellationSignal, RequestId};
pub use controller::{Arguments, ConstructorArgs, Controller, Invocation};
pub use converter::{converter_by_name, Converter, ConverterProvider, JsonConverter, TextConverter};
pub use error::{ActivationError, BodyError, ConversionError, ConverterError, ErrorCategory};
pub use metadata::{
    ControllerKind, ControllerMetadata, ControllerMetadataBuilder, CrudRole, Direction, MethodMetadata,
    MethodMetadataBuilder, ParameterMetadata, ParameterSource, ResultMetadata, ResultTarget,
};
pub use request::{accepts_media_type, media_type_essence, BodyStream, RequestBody, RequestInfo};
pub use response::ResponseInfo;
pub use types::TypeDescriptor;
