//! Controller descriptions and request mapping for Hypatia.
//!
//! This crate turns static [`ControllerMetadata`](hypatia_core::ControllerMetadata)
//! into routable operation descriptions and maps incoming requests onto them.
//!
//! # Features
//!
//! - **URI templates**: `{name}` path variables and a `{?a,b}` query placeholder,
//!   compiled to case-insensitive anchored matchers
//! - **Conventions**: verbs from method-name prefixes and popular words, routes
//!   from method and controller names
//! - **Pluggable defaults**: [`DefaultValueRelationSelector`] decides parameter
//!   sources and result targets the metadata leaves open
//! - **Specificity**: overlapping templates resolve to the one with the most
//!   literal text
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hypatia_core::{fixtures, RequestInfo};
//! use hypatia_router::{DelegateMapper, DescriptionCache};
//! use hypatia_url::UrlParserRegistry;
//! use http::Method;
//!
//! let cache = DescriptionCache::default();
//! let mut mapper = DelegateMapper::new(Arc::new(fixtures::factories()));
//! mapper.register(cache.get_or_build(&fixtures::person_controller_metadata()).unwrap());
//!
//! let url = UrlParserRegistry::with_defaults().parse("/api/person/12").unwrap();
//! let mapping = mapper.map_request(&RequestInfo::new(Method::DELETE, url)).unwrap().unwrap();
//!
//! assert_eq!(mapping.operation().unwrap().method_name(), "Delete");
//! assert_eq!(mapping.route_values().get("id"), Some("12"));
//! ```

#![doc(html_root_url = "https://docs.rs/hypatia-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cache;
pub mod conventions;
mod description;
mod error;
mod mapper;
mod params;
mod selector;
mod template;

pub use cache::DescriptionCache;
pub use description::{ArgumentInfo, ControllerDescriptionBuilder, ControllerInfo, OperationInfo, ResultInfo};
pub use error::DescriptionError;
pub use mapper::{DelegateMapper, MappingTarget, RequestMapping};
pub use params::RouteValues;
pub use selector::{ConventionSelector, DefaultValueRelationSelector};
pub use template::{TemplateRegex, UriTemplate};
