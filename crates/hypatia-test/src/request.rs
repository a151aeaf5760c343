//! Test request building.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use hypatia_core::CancellationSignal;
use serde::Serialize;

use crate::error::TestError;

const MULTIPART_BOUNDARY: &str = "hypatia-test-boundary";

/// A test request that can be sent to a [`TestClient`](crate::TestClient).
#[derive(Debug)]
pub struct TestRequest {
    /// HTTP method
    pub method: Method,
    /// Request URL, absolute or relative
    pub url: String,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Bytes,
    /// Cancellation signal handed to the pipeline
    pub cancellation: Option<CancellationSignal>,
}

impl TestRequest {
    /// Creates a new GET request.
    pub fn get(url: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, url)
    }

    /// Creates a new POST request.
    pub fn post(url: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, url)
    }

    /// Creates a new PUT request.
    pub fn put(url: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, url)
    }

    /// Creates a new DELETE request.
    pub fn delete(url: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, url)
    }

    /// Creates a new OPTIONS request.
    pub fn options(url: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::OPTIONS, url)
    }

    /// Converts this request to an HTTP request.
    pub fn into_http_request(self) -> Result<http::Request<Bytes>, TestError> {
        let mut request = http::Request::builder()
            .method(self.method)
            .uri(self.url.as_str())
            .body(self.body)
            .map_err(|e| TestError::RequestBuild(format!("invalid URL '{}': {e}", self.url)))?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}

/// Builder for constructing test requests.
///
/// Invalid headers or bodies do not panic here; they surface from
/// [`build`](Self::build).
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Bytes>,
    cancellation: Option<CancellationSignal>,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    pub fn new(method: Method, url: impl AsRef<str>) -> Self {
        Self {
            method,
            url: url.as_ref().to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            cancellation: None,
            error: None,
        }
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        match (
            HeaderName::try_from(name),
            HeaderValue::try_from(value.as_ref()),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => self.fail(TestError::InvalidHeader(name.to_string())),
        }
        self
    }

    /// Appends a query parameter, percent-encoding name and value.
    ///
    /// # Example
    ///
    /// ```
    /// use hypatia_test::TestRequest;
    ///
    /// let request = TestRequest::get("/api/test/greeting")
    ///     .query("name", "Ada Lovelace")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(request.url, "/api/test/greeting?name=Ada%20Lovelace");
    /// ```
    pub fn query(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.query
            .push((name.as_ref().to_string(), value.as_ref().to_string()));
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the Accept header.
    pub fn accept(self, accept: impl AsRef<str>) -> Self {
        self.header(header::ACCEPT.as_str(), accept)
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the request body as JSON and the `Content-Type` to
    /// `application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Some(Bytes::from(bytes)),
            Err(e) => self.fail(e.into()),
        }
        self.content_type("application/json")
    }

    /// Sets the request body as form-urlencoded.
    pub fn form<T: Serialize>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => self.body = Some(Bytes::from(encoded)),
            Err(e) => self.fail(e.into()),
        }
        self.content_type("application/x-www-form-urlencoded")
    }

    /// Sets the request body as `multipart/form-data` with one text part
    /// per field, in order. An empty name gives a part without a name.
    pub fn multipart<N, V>(mut self, fields: &[(N, V)]) -> Self
    where
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!("--{MULTIPART_BOUNDARY}\r\n"));
            if name.as_ref().is_empty() {
                body.push_str("Content-Disposition: form-data\r\n\r\n");
            } else {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    name.as_ref()
                ));
            }
            body.push_str(value.as_ref());
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{MULTIPART_BOUNDARY}--\r\n"));
        self.body = Some(Bytes::from(body));
        self.content_type(format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"))
    }

    /// Attaches a cancellation signal to the request.
    pub fn cancellation(mut self, signal: CancellationSignal) -> Self {
        self.cancellation = Some(signal);
        self
    }

    fn fail(&mut self, error: TestError) {
        self.error.get_or_insert(error);
    }

    /// Builds the test request.
    pub fn build(self) -> Result<TestRequest, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut url = self.url;
        if !self.query.is_empty() {
            let query = self
                .query
                .iter()
                .map(|(name, value)| {
                    format!("{}={}", urlencoding::encode(name), urlencoding::encode(value))
                })
                .collect::<Vec<_>>()
                .join("&");
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }

        Ok(TestRequest {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body.unwrap_or_default(),
            cancellation: self.cancellation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_methods() {
        assert_eq!(TestRequest::get("/a").build().unwrap().method, Method::GET);
        assert_eq!(TestRequest::post("/a").build().unwrap().method, Method::POST);
        assert_eq!(TestRequest::put("/a").build().unwrap().method, Method::PUT);
        assert_eq!(TestRequest::delete("/a").build().unwrap().method, Method::DELETE);
        assert_eq!(TestRequest::options("/a").build().unwrap().method, Method::OPTIONS);
    }

    #[test]
    fn test_query_appends_to_existing() {
        let request = TestRequest::get("/api/test/add?operandA=1")
            .query("operandB", "2")
            .build()
            .unwrap();
        assert_eq!(request.url, "/api/test/add?operandA=1&operandB=2");
    }

    #[test]
    fn test_json_body() {
        let request = TestRequest::post("/api/person")
            .json(&json!({ "name": "Ada" }))
            .build()
            .unwrap();

        assert_eq!(request.headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(request.body.as_ref(), br#"{"name":"Ada"}"#);
    }

    #[test]
    fn test_form_body() {
        let request = TestRequest::post("/api/concat/join")
            .form(&[("field0", "a b"), ("field1", "c")])
            .build()
            .unwrap();

        assert_eq!(
            request.headers[header::CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
        assert_eq!(request.body.as_ref(), b"field0=a+b&field1=c");
    }

    #[test]
    fn test_multipart_body() {
        let request = TestRequest::post("/api/concat/join")
            .multipart(&[("field0", "a"), ("", "b")])
            .build()
            .unwrap();

        let body = String::from_utf8(request.body.to_vec()).unwrap();
        assert!(body.contains("name=\"field0\"\r\n\r\na\r\n"));
        assert!(body.contains("Content-Disposition: form-data\r\n\r\nb\r\n"));
        assert!(body.ends_with("--hypatia-test-boundary--\r\n"));
    }

    #[test]
    fn test_invalid_header_surfaces_on_build() {
        let result = TestRequest::get("/a").header("bad header", "x").build();
        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }

    #[test]
    fn test_into_http_request() {
        let request = TestRequest::get("http://example.com/api/person/1")
            .header("x-client", "suite")
            .build()
            .unwrap()
            .into_http_request()
            .unwrap();

        assert_eq!(request.uri().host(), Some("example.com"));
        assert_eq!(request.headers()["x-client"], "suite");
    }
}
