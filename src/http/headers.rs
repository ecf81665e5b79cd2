//! Request headers as seen by handlers.
//!
//! HTTP/2 carries the method and path as pseudo-headers. hyper lifts them
//! out of the header map, so [`Headers`] keeps them alongside the regular
//! fields and answers `get(":method")` / `get(":path")` like any other name.

use std::sync::Arc;

use hyper::http::request::Parts;
use hyper::{HeaderMap, Method};

/// Cheaply cloneable view of a request's headers.
#[derive(Debug, Clone)]
pub struct Headers {
    inner: Arc<HeadersInner>,
}

#[derive(Debug)]
struct HeadersInner {
    method: Method,
    path: String,
    authority: Option<String>,
    scheme: Option<String>,
    fields: HeaderMap,
}

impl Headers {
    /// Build headers from a method, a `:path` value (path plus query) and regular fields.
    pub fn new(method: Method, path: impl Into<String>, fields: HeaderMap) -> Self {
        Self {
            inner: Arc::new(HeadersInner {
                method,
                path: path.into(),
                authority: None,
                scheme: None,
                fields,
            }),
        }
    }

    /// Build headers from the parts of a hyper request.
    pub fn from_parts(parts: &Parts) -> Self {
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        Self {
            inner: Arc::new(HeadersInner {
                method: parts.method.clone(),
                path,
                authority: parts.uri.authority().map(|a| a.as_str().to_string()),
                scheme: parts.uri.scheme_str().map(str::to_string),
                fields: parts.headers.clone(),
            }),
        }
    }

    /// The `:method` pseudo-header.
    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    /// The `:path` pseudo-header, including any query string.
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Look up a header by name. Pseudo-headers use their `:`-prefixed names.
    pub fn get(&self, name: &str) -> Option<&str> {
        match name {
            ":method" => Some(self.inner.method.as_str()),
            ":path" => Some(&self.inner.path),
            ":authority" => self.inner.authority.as_deref(),
            ":scheme" => self.inner.scheme.as_deref(),
            _ => self.inner.fields.get(name).and_then(|v| v.to_str().ok()),
        }
    }

    /// Regular (non-pseudo) header fields.
    pub fn fields(&self) -> &HeaderMap {
        &self.inner.fields
    }
}
