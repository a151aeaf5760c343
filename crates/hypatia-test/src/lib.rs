//! # Hypatia Test
//!
//! In-memory request testing for Hypatia services.
//!
//! - **In-memory**: requests go straight into a
//!   [`RequestHandler`](hypatia_server::RequestHandler); no port is bound
//! - **Request builder**: query parameters, JSON, form and multipart bodies,
//!   cancellation
//! - **Response assertions**: status, headers, JSON fields, error codes
//!
//! ## Example
//!
//! ```ignore
//! use hypatia_test::TestClient;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn creates_a_person() {
//!     let client = TestClient::new(handler);
//!
//!     client
//!         .post("http://example.com/api/person")
//!         .json(&json!({ "name": "Ada" }))
//!         .send()
//!         .await
//!         .assert_status(StatusCode::CREATED)
//!         .assert_header("location", "http://example.com/api/person/1");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/hypatia-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
