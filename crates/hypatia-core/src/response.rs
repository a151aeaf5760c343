//! Outgoing response model.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, Response, StatusCode};

use crate::request::RequestInfo;

/// The response being composed for a request.
///
/// Controllers receive it mutably during invocation. Setting a status or a
/// body marks it as populated, after which result composition only merges
/// headers into it.
#[derive(Debug)]
pub struct ResponseInfo {
    request: Arc<RequestInfo>,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    populated: bool,
}

impl ResponseInfo {
    /// Creates an empty `200 OK` response for `request`.
    #[must_use]
    pub fn new(request: Arc<RequestInfo>) -> Self {
        Self {
            request,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            populated: false,
        }
    }

    /// Returns the originating request.
    #[must_use]
    pub fn request(&self) -> &RequestInfo {
        &self.request
    }

    /// Returns a shared handle to the originating request.
    #[must_use]
    pub fn request_arc(&self) -> Arc<RequestInfo> {
        Arc::clone(&self.request)
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code and marks the response populated.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
        self.populated = true;
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the headers mutably. Does not mark the response populated.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns a header value as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Sets a header, replacing earlier values. Returns `false` when the name
    /// or value is not valid in HTTP.
    pub fn set_header(&mut self, name: &str, value: &str) -> bool {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
                true
            }
            _ => false,
        }
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Sets the body and its content type, and marks the response populated.
    pub fn set_body(&mut self, body: impl Into<Bytes>, content_type: &str) {
        self.write_body(body.into(), content_type);
        self.populated = true;
    }

    /// Writes a converted body without marking the response populated.
    ///
    /// Converters use this while composing the result.
    pub fn write_body(&mut self, body: Bytes, content_type: &str) {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            self.headers.insert(CONTENT_TYPE, value);
        }
        self.body = body;
    }

    /// Sets the status without marking the response populated.
    pub fn write_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns `true` if a controller set the status or body itself.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Converts into an [`http::Response`].
    #[must_use]
    pub fn into_http(self) -> Response<Bytes> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        if !response.body().is_empty() {
            let len = response.body().len();
            response
                .headers_mut()
                .insert(CONTENT_LENGTH, HeaderValue::from(len));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use hypatia_url::UrlParserRegistry;

    fn response() -> ResponseInfo {
        let url = UrlParserRegistry::with_defaults().parse("/api/test").unwrap();
        ResponseInfo::new(Arc::new(RequestInfo::new(Method::GET, url)))
    }

    #[test]
    fn test_defaults() {
        let response = response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body().is_empty());
        assert!(!response.is_populated());
    }

    #[test]
    fn test_headers_do_not_populate() {
        let mut response = response();
        assert!(response.set_header("x-total", "3"));
        assert!(!response.set_header("bad name", "3"));
        assert_eq!(response.header("x-total"), Some("3"));
        assert!(!response.is_populated());
    }

    #[test]
    fn test_set_body_populates() {
        let mut response = response();
        response.set_body("hi", "text/plain");
        assert!(response.is_populated());
        assert_eq!(response.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_write_body_does_not_populate() {
        let mut response = response();
        response.write_body(Bytes::from_static(b"1"), "application/json");
        response.write_status(StatusCode::CREATED);
        assert!(!response.is_populated());
    }

    #[test]
    fn test_into_http() {
        let mut response = response();
        response.set_status(StatusCode::CREATED);
        response.set_body("{}", "application/json");

        let http = response.into_http();
        assert_eq!(http.status(), StatusCode::CREATED);
        assert_eq!(http.headers()[CONTENT_LENGTH], "2");
        assert_eq!(&http.body()[..], b"{}");
    }
}
