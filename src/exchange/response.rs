use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use super::HeaderVec;

/// Default status of a fresh response.
const DEFAULT_STATUS: u16 = 200;

/// Snapshot of everything written to an [`ApiResponse`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseState {
    /// HTTP status code (200 until a handler sets another)
    pub status: u16,
    /// Response headers
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// JSON body, `None` until something is written
    pub body: Option<Value>,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self {
            status: DEFAULT_STATUS,
            headers: HeaderVec::new(),
            body: None,
        }
    }
}

/// Shared response handle.
///
/// Clones write to the same response, so middleware, handlers and the error handler
/// all see each other's writes. Whatever was written before a failure stays written.
#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    state: Arc<Mutex<ResponseState>>,
}

impl ApiResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the status code. Returns `self` so a body can be chained:
    /// `res.status(201).json(body)`.
    pub fn status(&self, status: u16) -> &Self {
        self.state.lock().status = status;
        self
    }

    /// Write a JSON body, setting `content-type: application/json`.
    pub fn json(&self, body: Value) {
        let mut state = self.state.lock();
        set_header(&mut state.headers, "content-type", "application/json".to_string());
        state.body = Some(body);
    }

    /// Add or update a header (case-insensitive name match).
    pub fn set_header(&self, name: &str, value: impl Into<String>) {
        set_header(&mut self.state.lock().headers, name, value.into());
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.state.lock().status
    }

    #[must_use]
    pub fn body(&self) -> Option<Value> {
        self.state.lock().body.clone()
    }

    /// Whether a body has been written.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.state.lock().body.is_some()
    }

    #[must_use]
    pub fn snapshot(&self) -> ResponseState {
        self.state.lock().clone()
    }

    /// Whether two handles refer to the same response.
    #[must_use]
    pub fn same_response(&self, other: &ApiResponse) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Render as an `http` response. String bodies are sent as `text/plain`, other
    /// JSON values serialised; no body yields an empty payload.
    pub fn to_http(&self) -> Result<http::Response<Vec<u8>>, http::Error> {
        let state = self.snapshot();
        let mut builder = http::Response::builder().status(state.status);
        let text_body = matches!(state.body, Some(Value::String(_)));
        let mut has_content_type = false;
        for (name, value) in &state.headers {
            let is_content_type = name.eq_ignore_ascii_case("content-type");
            if text_body && is_content_type {
                continue;
            }
            has_content_type |= is_content_type;
            builder = builder.header(name.as_ref(), value.as_str());
        }
        let payload = match state.body {
            Some(Value::String(s)) => {
                builder = builder.header("content-type", "text/plain");
                s.into_bytes()
            }
            Some(other) => {
                if !has_content_type {
                    builder = builder.header("content-type", "application/json");
                }
                other.to_string().into_bytes()
            }
            None => Vec::new(),
        };
        builder.body(payload)
    }
}

fn set_header(headers: &mut HeaderVec, name: &str, value: String) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    headers.push((Arc::from(name.to_ascii_lowercase()), value));
}
