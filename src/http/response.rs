//! Response values and their wire rendering.
//!
//! # Responsibilities
//! - Model the values a handler may pass to `next`
//! - Render them onto a [`Stream`] (status, content-type, body)
//! - Produce the built-in plain-text responses (404, 500, body errors)
//!
//! # Design Decisions
//! - Text is sent without a content-type; the peer's default applies
//! - JSON is serialized when the reply is built, so a value that cannot be
//!   serialized degrades to a diagnostic body instead of failing the stream

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{HeaderMap, Response, StatusCode};
use serde::Serialize;

use crate::error::StreamError;
use crate::http::{Stream, WireResponse};

/// A value handed to the continuation to finish the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Status 200, empty body.
    Empty,
    /// Status 200, the string as body, no content-type.
    Text(String),
    /// Status 200, `application/json`, pre-serialized body.
    Json(String),
    /// A value that could not be rendered; carries the reason.
    Unsupported(String),
}

impl Reply {
    /// Serialize `value` as a JSON reply.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Reply::Json(body),
            Err(e) => Reply::Unsupported(e.to_string()),
        }
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Empty
    }
}

impl From<&str> for Reply {
    fn from(s: &str) -> Self {
        Reply::Text(s.to_string())
    }
}

impl From<String> for Reply {
    fn from(s: String) -> Self {
        Reply::Text(s)
    }
}

impl From<serde_json::Value> for Reply {
    fn from(value: serde_json::Value) -> Self {
        Reply::Json(value.to_string())
    }
}

/// Write `reply` to `stream` and finalize it.
pub fn finalize(stream: &Stream, reply: Reply) -> Result<(), StreamError> {
    match reply {
        Reply::Empty => stream.end(""),
        Reply::Text(body) => stream.end(body),
        Reply::Json(body) => {
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            stream.respond(StatusCode::OK, headers)?;
            stream.end(body)
        }
        Reply::Unsupported(reason) => {
            tracing::warn!(stream_id = %stream.id(), reason = %reason, "Unsupported response value");
            stream.end(format!("Unsupported response value: {reason}"))
        }
    }
}

/// Finalize `stream` with a `text/plain` body and the given status.
pub fn plain_text(stream: &Stream, status: StatusCode, body: &'static str) -> Result<(), StreamError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    stream.respond(status, headers)?;
    stream.end(body)
}

/// A `text/plain` response built without a stream, for when the stream is gone.
pub fn plain_response(status: StatusCode, body: &'static str) -> WireResponse {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}
