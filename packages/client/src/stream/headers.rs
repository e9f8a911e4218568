//! Request header sets.

use http::{HeaderMap, Method};

/// The header block sent by [`send_headers`](super::StreamHandle::send_headers).
///
/// Pseudo-header information (method, scheme, authority, path) is carried in
/// dedicated fields because `http::HeaderMap` cannot represent `:`-prefixed
/// names; regular headers travel in `headers`.
#[derive(Debug, Clone)]
pub struct RequestHeaders {
    pub method: Method,
    pub scheme: String,
    pub authority: String,
    pub path: String,
    pub headers: HeaderMap,
}

impl RequestHeaders {
    #[must_use]
    pub fn new(
        method: Method,
        scheme: impl Into<String>,
        authority: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            method,
            scheme: scheme.into(),
            authority: authority.into(),
            path: path.into(),
            headers: HeaderMap::new(),
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}
