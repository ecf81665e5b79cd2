//! Per-request parameters.

use std::borrow::Cow;
use std::collections::HashMap;

use bytes::Bytes;

/// Values extracted from a request for its handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    /// Captures of `:name` segments in the route pattern.
    pub path: HashMap<String, String>,
    /// Decoded query-string pairs. A repeated key keeps its last value.
    pub get: HashMap<String, String>,
    /// Raw request body, set only on routes registered with body buffering.
    pub body: Option<Bytes>,
}

impl Params {
    /// The buffered body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> Option<Cow<'_, str>> {
        self.body.as_deref().map(String::from_utf8_lossy)
    }
}
