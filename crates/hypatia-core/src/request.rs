//! Incoming request model.

use std::fmt;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::StreamExt;
use http::header::{HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, Method};
use hypatia_url::Url;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::context::{CancellationSignal, RequestId};
use crate::error::BodyError;

/// A boxed stream of body chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

enum BodySource {
    Full(Bytes),
    Stream(BodyStream),
}

/// The request payload.
///
/// The body is read at most once; the collected bytes are cached so every
/// binder sees the same payload.
pub struct RequestBody {
    source: Mutex<Option<BodySource>>,
    collected: OnceCell<Bytes>,
}

impl RequestBody {
    /// An empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::from(Bytes::new())
    }

    /// A body produced by a chunk stream.
    #[must_use]
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static,
    {
        Self {
            source: Mutex::new(Some(BodySource::Stream(Box::pin(stream)))),
            collected: OnceCell::new(),
        }
    }

    /// Returns the whole body, reading it on first use.
    ///
    /// # Errors
    ///
    /// [`BodyError::TooLarge`] when more than `limit` bytes arrive,
    /// [`BodyError::Cancelled`] when `cancellation` fires first.
    pub async fn bytes(
        &self,
        limit: usize,
        cancellation: &CancellationSignal,
    ) -> Result<Bytes, BodyError> {
        self.collected
            .get_or_try_init(|| async {
                let source = self.source.lock().take();
                let collect = collect(source, limit);
                tokio::select! {
                    biased;
                    () = cancellation.cancelled() => Err(BodyError::Cancelled),
                    result = collect => result,
                }
            })
            .await
            .cloned()
    }
}

async fn collect(source: Option<BodySource>, limit: usize) -> Result<Bytes, BodyError> {
    match source {
        None => Ok(Bytes::new()),
        Some(BodySource::Full(bytes)) if bytes.len() > limit => Err(BodyError::TooLarge { limit }),
        Some(BodySource::Full(bytes)) => Ok(bytes),
        Some(BodySource::Stream(mut stream)) => {
            let mut buffer = BytesMut::new();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                if buffer.len() + chunk.len() > limit {
                    return Err(BodyError::TooLarge { limit });
                }
                buffer.extend_from_slice(&chunk);
            }
            Ok(buffer.freeze())
        }
    }
}

impl Default for RequestBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        Self {
            source: Mutex::new(Some(BodySource::Full(bytes))),
            collected: OnceCell::new(),
        }
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(Bytes::from(bytes))
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        Self::from(Bytes::from(text))
    }
}

impl From<&'static str> for RequestBody {
    fn from(text: &'static str) -> Self {
        Self::from(Bytes::from_static(text.as_bytes()))
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match (self.collected.get(), &*self.source.lock()) {
            (Some(bytes), _) => format!("collected({} bytes)", bytes.len()),
            (None, Some(BodySource::Full(bytes))) => format!("full({} bytes)", bytes.len()),
            (None, Some(BodySource::Stream(_))) => "stream".to_string(),
            (None, None) => "consumed".to_string(),
        };
        f.debug_tuple("RequestBody").field(&state).finish()
    }
}

/// An incoming request: verb, parsed URL, headers and body.
///
/// # Example
///
/// ```
/// use hypatia_core::RequestInfo;
/// use hypatia_url::UrlParserRegistry;
/// use http::Method;
///
/// let url = UrlParserRegistry::with_defaults()
///     .parse("http://localhost/api/person/1")
///     .unwrap();
/// let request = RequestInfo::new(Method::GET, url).with_header("accept", "application/json");
///
/// assert_eq!(request.accept(), Some("application/json"));
/// assert!(!request.is_output_neutral());
/// ```
#[derive(Debug)]
pub struct RequestInfo {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: RequestBody,
    request_id: RequestId,
    cancellation: CancellationSignal,
}

impl RequestInfo {
    /// Creates a request with no headers and an empty body.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: RequestBody::empty(),
            request_id: RequestId::new(),
            cancellation: CancellationSignal::new(),
        }
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => tracing::warn!(header = %name, "ignoring invalid request header"),
        }
        self
    }

    /// Replaces the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Uses an externally owned cancellation signal.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationSignal) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Returns the HTTP verb.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Returns the `Accept` header.
    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.headers.get(ACCEPT).and_then(|v| v.to_str().ok())
    }

    /// Returns `true` when the client accepts any response format.
    #[must_use]
    pub fn is_output_neutral(&self) -> bool {
        match self.accept() {
            None => true,
            Some(accept) => accept.trim().is_empty() || accepts_media_type(accept, "*/*"),
        }
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the cancellation signal.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationSignal {
        &self.cancellation
    }
}

/// Returns the essence (`type/subtype`, lower-cased) of a media type.
#[must_use]
pub fn media_type_essence(value: &str) -> Option<String> {
    value
        .parse::<mime::Mime>()
        .ok()
        .map(|mime| mime.essence_str().to_ascii_lowercase())
}

/// Returns `true` if an `Accept` header lists `media_type` literally.
///
/// Quality values are ignored; `q=0` entries do not count.
#[must_use]
pub fn accepts_media_type(accept: &str, media_type: &str) -> bool {
    accept.split(',').any(|entry| {
        let mut parts = entry.split(';').map(str::trim);
        let essence = parts.next().unwrap_or_default();
        let rejected = parts.any(|param| {
            param
                .strip_prefix("q=")
                .and_then(|q| q.parse::<f32>().ok())
                .is_some_and(|q| q <= 0.0)
        });
        !rejected && essence.eq_ignore_ascii_case(media_type)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use hypatia_url::UrlParserRegistry;

    fn url(text: &str) -> Url {
        UrlParserRegistry::with_defaults().parse(text).unwrap()
    }

    #[tokio::test]
    async fn test_full_body_is_returned() {
        let body = RequestBody::from("hello");
        let bytes = body.bytes(1024, &CancellationSignal::new()).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn test_body_is_cached_after_first_read() {
        let chunks = vec![Ok(Bytes::from("ab")), Ok(Bytes::from("cd"))];
        let body = RequestBody::from_stream(stream::iter(chunks));
        let signal = CancellationSignal::new();

        let first = body.bytes(1024, &signal).await.unwrap();
        let second = body.bytes(1024, &signal).await.unwrap();
        assert_eq!(&first[..], b"abcd");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_stream_over_limit_fails() {
        let chunks = vec![Ok(Bytes::from("abc")), Ok(Bytes::from("def"))];
        let body = RequestBody::from_stream(stream::iter(chunks));
        let err = body.bytes(4, &CancellationSignal::new()).await.unwrap_err();
        assert!(matches!(err, BodyError::TooLarge { limit: 4 }));
    }

    #[tokio::test]
    async fn test_cancelled_read() {
        let body = RequestBody::from_stream(stream::pending());
        let signal = CancellationSignal::new();
        signal.cancel();

        let err = body.bytes(1024, &signal).await.unwrap_err();
        assert!(matches!(err, BodyError::Cancelled));
    }

    #[test]
    fn test_output_neutral() {
        let request = RequestInfo::new(Method::GET, url("/a"));
        assert!(request.is_output_neutral());

        let request = RequestInfo::new(Method::GET, url("/a")).with_header("accept", "text/html, */*;q=0.8");
        assert!(request.is_output_neutral());

        let request = RequestInfo::new(Method::GET, url("/a")).with_header("accept", "text/plain");
        assert!(!request.is_output_neutral());
    }

    #[test]
    fn test_accepts_media_type_ignores_rejected_entries() {
        assert!(accepts_media_type("application/json; q=0.5", "application/json"));
        assert!(!accepts_media_type("application/json;q=0", "application/json"));
        assert!(!accepts_media_type("application/jsonx", "application/json"));
    }

    #[test]
    fn test_media_type_essence() {
        assert_eq!(
            media_type_essence("Application/JSON; charset=utf-8").as_deref(),
            Some("application/json")
        );
        assert_eq!(media_type_essence("garbage"), None);
    }

    #[test]
    fn test_invalid_header_is_ignored() {
        let request = RequestInfo::new(Method::GET, url("/a")).with_header("bad header", "x");
        assert!(request.headers().is_empty());
    }
}
