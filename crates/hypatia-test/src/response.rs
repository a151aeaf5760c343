//! Test response wrapper.

use std::fmt;

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use hypatia_core::RequestId;
use hypatia_server::REQUEST_ID_HEADER;
use serde::de::DeserializeOwned;

use crate::error::TestError;

/// A test response with helper methods for assertions.
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Creates a test response from an HTTP response.
    pub fn from_http(response: http::Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Creates a test response from raw parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true if the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Returns a header value as a string, if it is valid UTF-8.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the request ID echoed by the pipeline.
    #[must_use]
    pub fn request_id(&self) -> Option<RequestId> {
        self.header_str(REQUEST_ID_HEADER)?.parse().ok()
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        serde_json::from_slice(&self.body).map_err(TestError::Json)
    }

    /// Deserializes the body as a JSON value.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// Returns the `error.code` of an error envelope body.
    pub fn error_code(&self) -> Result<String, TestError> {
        let body = self.json_value()?;
        body["error"]["code"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| TestError::BodyRead("body is not an error envelope".to_string()))
    }

    // Assertion methods

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    #[track_caller]
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {} with body {}",
            expected,
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that the status code equals the expected u16 value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    #[track_caller]
    pub fn assert_status_code(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "Expected status {}, got {}",
            expected,
            self.status.as_u16()
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    #[track_caller]
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("Header '{}' not found", name));
        assert_eq!(
            actual, expected,
            "Header '{}': expected '{}', got '{}'",
            name, expected, actual
        );
        self
    }

    /// Asserts that a header is absent.
    ///
    /// # Panics
    ///
    /// Panics if the header is present.
    #[track_caller]
    pub fn assert_no_header(&self, name: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        assert!(
            self.header(name).is_none(),
            "Header '{}' should be absent, got {:?}",
            name,
            self.header(name)
        );
        self
    }

    /// Asserts that the Content-Type header starts with `expected`.
    ///
    /// # Panics
    ///
    /// Panics if Content-Type is missing or doesn't match.
    #[track_caller]
    pub fn assert_content_type(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let actual = self
            .content_type()
            .unwrap_or_else(|| panic!("Content-Type header not found"));
        assert!(
            actual.starts_with(expected),
            "Content-Type: expected '{}', got '{}'",
            expected,
            actual
        );
        self
    }

    /// Asserts that the body is empty.
    ///
    /// # Panics
    ///
    /// Panics if the body is not empty.
    #[track_caller]
    pub fn assert_empty_body(&self) -> &Self {
        assert!(
            self.body.is_empty(),
            "Body should be empty, got: {}",
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that the body equals the expected string.
    ///
    /// # Panics
    ///
    /// Panics if the body doesn't match.
    #[track_caller]
    pub fn assert_body_eq(&self, expected: impl AsRef<str>) -> &Self {
        let body = String::from_utf8_lossy(&self.body);
        assert_eq!(body, expected.as_ref(), "Body mismatch");
        self
    }

    /// Asserts that the JSON body matches the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or doesn't match.
    #[track_caller]
    pub fn assert_json_eq(&self, expected: &serde_json::Value) -> &Self {
        let actual = self
            .json_value()
            .unwrap_or_else(|e| panic!("Body should be valid JSON: {e}"));
        assert_eq!(&actual, expected, "JSON body mismatch");
        self
    }

    /// Asserts that a JSON field exists and equals the expected value.
    ///
    /// Paths are dot separated; numeric segments index arrays
    /// (`error.code`, `0.name`).
    ///
    /// # Panics
    ///
    /// Panics if the field doesn't exist or doesn't match.
    #[track_caller]
    pub fn assert_json_field(&self, path: impl AsRef<str>, expected: &serde_json::Value) -> &Self {
        let path = path.as_ref();
        let json = self
            .json_value()
            .unwrap_or_else(|e| panic!("Body should be valid JSON: {e}"));
        let actual = json_path(&json, path)
            .unwrap_or_else(|| panic!("JSON path '{}' not found in: {:?}", path, json));
        assert_eq!(
            actual, expected,
            "JSON field '{}': expected {:?}, got {:?}",
            path, expected, actual
        );
        self
    }

    /// Asserts the `Location` header of a created entity.
    ///
    /// # Panics
    ///
    /// Panics if `Location` is missing or differs.
    #[track_caller]
    pub fn assert_location(&self, expected: impl AsRef<str>) -> &Self {
        self.assert_header(header::LOCATION.as_str(), expected)
    }

    /// Asserts that the `Allow` header of an OPTIONS response lists every
    /// verb in `verbs`, in any order.
    ///
    /// # Panics
    ///
    /// Panics if `Allow` is missing or lacks a verb.
    #[track_caller]
    pub fn assert_allows(&self, verbs: &[&str]) -> &Self {
        let allow = self
            .header_str(header::ALLOW.as_str())
            .unwrap_or_else(|| panic!("Allow header not found"));
        let listed: Vec<&str> = allow.split(',').map(str::trim).collect();
        for verb in verbs {
            assert!(
                listed.iter().any(|v| v.eq_ignore_ascii_case(verb)),
                "Allow '{allow}' does not list {verb}"
            );
        }
        self
    }

    /// Asserts the response is an error envelope with `code`.
    ///
    /// # Panics
    ///
    /// Panics if the body is not an error envelope or the code differs.
    #[track_caller]
    pub fn assert_error_code(&self, code: &str) -> &Self {
        let actual = self
            .error_code()
            .unwrap_or_else(|e| panic!("Expected error envelope: {e}"));
        assert_eq!(actual, code, "Error code mismatch");
        self
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

fn json_path<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let mut current = value;
    for segment in path.split('.') {
        if segment.is_empty() {
            continue;
        }
        current = match segment.parse::<usize>() {
            Ok(index) => current.get(index)?,
            Err(_) => current.get(segment)?,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: &str) -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        TestResponse::new(
            StatusCode::from_u16(status).unwrap(),
            headers,
            Bytes::from(body.to_string()),
        )
    }

    #[test]
    fn test_json_helpers() {
        let response = response(200, r#"[{"name":"Ada"}]"#);
        response
            .assert_status(StatusCode::OK)
            .assert_content_type("application/json")
            .assert_json_field("0.name", &json!("Ada"))
            .assert_json_eq(&json!([{ "name": "Ada" }]));
    }

    #[test]
    fn test_error_code() {
        let resp = response(400, r#"{"error":{"code":"MISSING_PARAMETER"}}"#);
        resp.assert_error_code("MISSING_PARAMETER");

        assert!(response(200, "3").error_code().is_err());
    }

    #[test]
    fn test_allow_and_location() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ALLOW, HeaderValue::from_static("GET, POST, OPTIONS"));
        headers.insert(header::LOCATION, HeaderValue::from_static("/api/person/1"));
        let response = TestResponse::new(StatusCode::OK, headers, Bytes::new());

        response
            .assert_allows(&["get", "OPTIONS"])
            .assert_location("/api/person/1");
    }

    #[test]
    #[should_panic(expected = "does not list DELETE")]
    fn test_allow_missing_verb_panics() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ALLOW, HeaderValue::from_static("GET, OPTIONS"));
        TestResponse::new(StatusCode::OK, headers, Bytes::new()).assert_allows(&["DELETE"]);
    }

    #[test]
    #[should_panic(expected = "Expected status")]
    fn test_assert_status_panics() {
        response(404, "").assert_status(StatusCode::OK);
    }

    #[test]
    fn test_request_id_parsing() {
        let id = RequestId::new();
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        let response = TestResponse::new(StatusCode::NO_CONTENT, headers, Bytes::new());

        assert_eq!(response.request_id(), Some(id));
        response.assert_empty_body().assert_no_header("content-type");
    }
}
