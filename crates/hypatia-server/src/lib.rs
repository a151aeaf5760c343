//! The Hypatia request pipeline.
//!
//! [`RequestHandler`] takes a [`RequestInfo`](hypatia_core::RequestInfo),
//! maps it to an operation, binds the operation's arguments, invokes the
//! controller and composes the response:
//!
//! - [`ResponseComposer`] applies the CRUD status conventions and writes
//!   body and header results
//! - [`PreRequestHandler`]s run before mapping and may answer early
//! - [`PostRequestHandler`]s run after composition
//! - [`PipelineError`] classifies failures and renders JSON error envelopes
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use http::Method;
//! use hypatia_core::{fixtures, ConverterProvider, JsonConverter, RequestInfo};
//! use hypatia_router::{ControllerDescriptionBuilder, DelegateMapper};
//! use hypatia_server::RequestHandler;
//! use hypatia_url::UrlParserRegistry;
//!
//! # tokio_test::block_on(async {
//! let mut mapper = DelegateMapper::new(Arc::new(fixtures::factories()));
//! let info = ControllerDescriptionBuilder::new()
//!     .build(&fixtures::TestController::metadata())
//!     .unwrap();
//! mapper.register(Arc::new(info));
//!
//! let converters = Arc::new(ConverterProvider::with_converters(vec![Arc::new(JsonConverter)]));
//! let handler = RequestHandler::builder(Arc::new(mapper), converters).build();
//!
//! let url = UrlParserRegistry::with_defaults().parse("/api/test/add?operandA=1&operandB=2").unwrap();
//! let response = handler.handle(RequestInfo::new(Method::GET, url)).await;
//! assert_eq!(response.status(), 200);
//! assert_eq!(response.body().as_ref(), b"3");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/hypatia-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod composer;
mod error;
mod handlers;
mod pipeline;

pub use composer::ResponseComposer;
pub use error::{ErrorBody, ErrorEnvelope, PipelineError};
pub use handlers::{PostRequestHandler, PreRequestHandler, PreRequestOutcome};
pub use pipeline::{RequestHandler, RequestHandlerBuilder, REQUEST_ID_HEADER};
