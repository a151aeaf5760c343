//! # Hypatia
//!
//! **Convention-driven REST framework core**
//!
//! Hypatia maps HTTP requests onto controller operations described by
//! metadata, binds arguments from the URL, query, headers and body, and
//! composes responses following CRUD conventions:
//!
//! - **Pluggable URLs** - parsers registered per scheme (`http`, `ftp`, `urn`)
//! - **Route conventions** - verbs and routes deduced from method names
//! - **Content negotiation** - converters ranked by a compatibility lattice
//! - **CRUD semantics** - `201` + `Location`, `404`, `409` and `204` by convention
//! - **Structured telemetry** - `tracing` spans per request, Prometheus metrics
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hypatia::prelude::*;
//!
//! let config = ConfigLoader::new()
//!     .with_optional_file("hypatia.toml")?
//!     .with_env_prefix("HYPATIA")
//!     .load()?;
//!
//! let app = Application::builder()
//!     .config(config)
//!     .controller_instance(ReadWrite::<BookStore>::metadata("BookController"), Arc::new(ReadWrite(BookStore::default())))
//!     .build()?;
//! app.init_telemetry()?;
//!
//! let response = app.handle(request).await;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → URL parsing → Pre handlers → DelegateMapper → ArgumentBinder
//!                                                              ↓
//! Response ← Post handlers ← ResponseComposer ← Controller::invoke
//! ```

#![doc(html_root_url = "https://docs.rs/hypatia/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod application;
mod error;

pub use application::{Application, ApplicationBuilder};
pub use error::ApplicationError;

// Re-export URL types
pub use hypatia_url as url;

// Re-export core types
pub use hypatia_core as core;

// Re-export description and mapping types
pub use hypatia_router as router;

// Re-export argument binding types
pub use hypatia_extract as extract;

// Re-export the request pipeline
pub use hypatia_server as server;

// Re-export telemetry
pub use hypatia_telemetry as telemetry;

// Re-export configuration
pub use hypatia_config as config;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use hypatia::prelude::*;
///
/// let config = HypatiaConfig::default();
/// assert!(config.validate().is_ok());
/// ```
pub mod prelude {
    pub use crate::{Application, ApplicationBuilder, ApplicationError};

    pub use hypatia_core::crud::{ReadController, ReadOnly, ReadWrite, WriteController, WriteOutcome};
    pub use hypatia_core::{
        Arguments, CancellationSignal, ConstructorArgs, Controller, ControllerMetadata, Converter,
        Invocation, MethodMetadata, ParameterMetadata, RequestId, RequestInfo, ResponseInfo,
        ResultMetadata, TypeDescriptor,
    };

    pub use hypatia_config::{ConfigLoader, HypatiaConfig};

    pub use hypatia_server::{PostRequestHandler, PreRequestHandler, PreRequestOutcome};

    pub use hypatia_url::{Url, UrlParser};
}
