use std::sync::Arc;

use serde_json::Value;
use smallvec::SmallVec;
use tracing::debug;

use crate::ids::{RequestId, REQUEST_ID_HEADER};

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage; names are lower-cased on insert.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Read access to the raw HTTP method of a request.
///
/// The method is the only thing the route machinery reads from a request; the
/// request id, when there is one, only labels trace events.
pub trait RequestMethod {
    /// Method as received (any case, may be outside the allowed set).
    fn method(&self) -> &str;

    fn request_id(&self) -> Option<RequestId> {
        None
    }
}

impl<B> RequestMethod for http::Request<B> {
    fn method(&self) -> &str {
        http::Request::method(self).as_str()
    }
}

impl<T: RequestMethod + ?Sized> RequestMethod for Arc<T> {
    fn method(&self) -> &str {
        (**self).method()
    }

    fn request_id(&self) -> Option<RequestId> {
        (**self).request_id()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct RequestParts {
    request_id: RequestId,
    method: String,
    path: String,
    headers: HeaderVec,
    body: Option<Value>,
}

/// Bundled request type.
///
/// Cloning shares the underlying data; builder methods copy on write.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    inner: Arc<RequestParts>,
}

impl ApiRequest {
    /// Request with the given method (kept exactly as given) and path.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RequestParts {
                request_id: RequestId::new(),
                method: method.into(),
                path: path.into(),
                headers: HeaderVec::new(),
                body: None,
            }),
        }
    }

    /// Add or replace a header. Setting `x-request-id` to a valid ULID also sets the
    /// request id.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        let name = name.to_ascii_lowercase();
        let parts = Arc::make_mut(&mut self.inner);
        if name == REQUEST_ID_HEADER {
            parts.request_id = RequestId::from_header_or_new(Some(&value));
        }
        parts.headers.retain(|(k, _)| k.as_ref() != name);
        parts.headers.push((Arc::from(name), value));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        Arc::make_mut(&mut self.inner).body = Some(body);
        self
    }

    /// Convert an `http` request carrying an already-parsed JSON body.
    ///
    /// Header values that are not visible ASCII are skipped.
    #[must_use]
    pub fn from_http(req: http::Request<Option<Value>>) -> Self {
        let (parts, body) = req.into_parts();
        let mut headers = HeaderVec::new();
        for (name, value) in &parts.headers {
            match value.to_str() {
                Ok(v) => headers.push((Arc::from(name.as_str()), v.to_string())),
                Err(_) => debug!(header = %name, "Skipping non-ASCII header value"),
            }
        }
        let request_id = RequestId::from_header_or_new(
            headers
                .iter()
                .find(|(k, _)| k.as_ref() == REQUEST_ID_HEADER)
                .map(|(_, v)| v.as_str()),
        );
        Self {
            inner: Arc::new(RequestParts {
                request_id,
                method: parts.method.as_str().to_string(),
                path: parts.uri.path().to_string(),
                headers,
                body,
            }),
        }
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.inner.request_id
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.inner.headers
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.inner
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.inner.body.as_ref()
    }

    /// Body as a string, when it is a JSON string.
    #[must_use]
    pub fn body_str(&self) -> Option<&str> {
        self.inner.body.as_ref().and_then(Value::as_str)
    }

    /// Whether two handles refer to the same request.
    #[must_use]
    pub fn same_request(&self, other: &ApiRequest) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl RequestMethod for ApiRequest {
    fn method(&self) -> &str {
        &self.inner.method
    }

    fn request_id(&self) -> Option<RequestId> {
        Some(self.inner.request_id)
    }
}
