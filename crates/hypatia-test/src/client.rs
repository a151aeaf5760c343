//! Test client for in-memory request testing.

use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use hypatia_core::CancellationSignal;
use hypatia_server::RequestHandler;

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;

/// A test client that sends requests straight into a [`RequestHandler`].
///
/// No sockets are involved; each request goes through the whole pipeline,
/// including URL parsing of the raw request line.
///
/// # Example
///
/// ```ignore
/// use hypatia_test::TestClient;
///
/// let client = TestClient::new(handler);
///
/// let response = client
///     .get("/api/test/add")
///     .query("operandA", "1")
///     .query("operandB", "2")
///     .send()
///     .await;
///
/// response.assert_status(StatusCode::OK).assert_body_eq("3");
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    handler: Arc<RequestHandler>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a test client over `handler`.
    pub fn new(handler: impl Into<Arc<RequestHandler>>) -> Self {
        Self {
            handler: handler.into(),
            default_headers: Vec::new(),
        }
    }

    /// Adds a default header that will be included in all requests.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Returns the handler requests are sent to.
    #[must_use]
    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    /// Creates a GET request builder.
    pub fn get(&self, url: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::get(url))
    }

    /// Creates a POST request builder.
    pub fn post(&self, url: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::post(url))
    }

    /// Creates a PUT request builder.
    pub fn put(&self, url: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::put(url))
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, url: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::delete(url))
    }

    /// Creates an OPTIONS request builder.
    pub fn options(&self, url: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::options(url))
    }

    /// Creates a request builder with a custom method.
    pub fn request(&self, method: Method, url: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, url))
    }

    /// Sends a built request.
    pub async fn execute(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let cancellation = request.cancellation.clone();
        let http = request.into_http_request()?;

        let response = match cancellation {
            None => self.handler.handle_http(http).await,
            Some(signal) => self.handle_with_signal(http, signal).await?,
        };
        Ok(TestResponse::from_http(response))
    }

    async fn handle_with_signal(
        &self,
        http: http::Request<Bytes>,
        signal: CancellationSignal,
    ) -> Result<http::Response<Bytes>, TestError> {
        let request = self
            .handler
            .request_from_http(http)
            .map_err(|e| TestError::Rejected(e.to_string()))?;
        Ok(self.handler.handle(request.with_cancellation(signal)).await)
    }
}

/// A request builder bound to a test client.
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, builder: TestRequestBuilder) -> Self {
        let builder = client
            .default_headers
            .iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value));
        Self { client, builder }
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Appends a query parameter.
    pub fn query(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.query(name, value);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets the Accept header.
    pub fn accept(mut self, accept: impl AsRef<str>) -> Self {
        self.builder = self.builder.accept(accept);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets the request body as form-urlencoded.
    pub fn form<T: serde::Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Sets a `multipart/form-data` body.
    pub fn multipart<N: AsRef<str>, V: AsRef<str>>(mut self, fields: &[(N, V)]) -> Self {
        self.builder = self.builder.multipart(fields);
        self
    }

    /// Attaches a cancellation signal.
    pub fn cancellation(mut self, signal: CancellationSignal) -> Self {
        self.builder = self.builder.cancellation(signal);
        self
    }

    /// Sends the request and returns the response.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn send(self) -> TestResponse {
        self.try_send()
            .await
            .unwrap_or_else(|e| panic!("test request failed: {e}"))
    }

    /// Sends the request and returns a Result.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.execute(request).await
    }
}
