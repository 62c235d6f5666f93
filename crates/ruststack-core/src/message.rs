//! HTTP-shaped request and response values.
//!
//! These are the lowest common denominator between the structured operation
//! framework and path-routed backend handlers: a method, a path, headers and
//! a buffered body going in; a status, headers and a buffered body coming out.

use bytes::Bytes;
use http::header::{HOST, HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};

use crate::error::{RustStackError, RustStackResult};

/// A fully buffered HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Request path, without the query string.
    pub path: String,
    /// Raw query string (without the leading `?`), if any.
    pub query: Option<String>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl HttpRequest {
    /// Create a request with no headers and an empty body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Set the query string.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.query = (!query.is_empty()).then_some(query);
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Insert a header, replacing any previous values.
    ///
    /// # Errors
    /// Returns [`RustStackError::InvalidHeader`] if the name or value is not
    /// valid on the wire.
    pub fn with_header(mut self, name: &str, value: &str) -> RustStackResult<Self> {
        self.set_header(name, value)?;
        Ok(self)
    }

    /// Insert a header in place, replacing any previous values.
    ///
    /// # Errors
    /// Returns [`RustStackError::InvalidHeader`] if the name or value is not
    /// valid on the wire.
    pub fn set_header(&mut self, name: &str, value: &str) -> RustStackResult<()> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| RustStackError::InvalidHeader {
                name: name.to_owned(),
                reason: e.to_string(),
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| RustStackError::InvalidHeader {
                name: name.to_owned(),
                reason: e.to_string(),
            })?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    /// The `Host` header, if present and valid UTF-8.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.headers.get(HOST).and_then(|v| v.to_str().ok())
    }

    /// Build the absolute URL of this request.
    ///
    /// Uses the `Host` header when present, `fallback_host` otherwise.
    #[must_use]
    pub fn url(&self, fallback_host: &str) -> String {
        let host = self.host().unwrap_or(fallback_host);
        match &self.query {
            Some(q) => format!("http://{host}{}?{q}", self.path),
            None => format!("http://{host}{}", self.path),
        }
    }
}

/// A fully buffered HTTP response: status, headers and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a response from its three parts.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Create a response with the given status and body and no headers.
    #[must_use]
    pub fn from_status(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::new(status, HeaderMap::new(), body)
    }

    /// Create a JSON response with the given status.
    #[must_use]
    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self::new(status, headers, value.to_string())
    }

    /// Whether the status denotes an error (anything above 300).
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status.as_u16() >= 301
    }

    /// The body as UTF-8 text, lossily decoded.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
