//! Request body buffering decorator.
//!
//! # Responsibilities
//! - Read every data chunk of the request body, in delivery order
//! - Store the concatenation in `params.body`, undecoded
//! - Invoke the wrapped handler once the body has ended
//!
//! # Design Decisions
//! - Bounded by `BodyLimits`: 413 when too large, 408 when too slow
//! - A body read error answers 400
//! - On any of those failures the wrapped handler is never invoked

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use hyper::StatusCode;

use crate::dispatch::Next;
use crate::error::StreamError;
use crate::handler::{BodyLimits, BoxedHandler, Handler, HandlerFuture};
use crate::http::response::plain_text;
use crate::http::{Headers, Stream};
use crate::routing::Params;

/// Wraps a handler so it only runs once the full request body is available.
pub struct BufferBody {
    inner: BoxedHandler,
    limits: BodyLimits,
}

impl BufferBody {
    pub fn new(inner: BoxedHandler, limits: BodyLimits) -> Self {
        Self { inner, limits }
    }
}

enum BufferError {
    TooLarge,
    Stream(StreamError),
}

async fn read_body(stream: &Stream, max_bytes: usize) -> Result<Bytes, BufferError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.data().await {
        let chunk = chunk.map_err(BufferError::Stream)?;
        if buf.len() + chunk.len() > max_bytes {
            return Err(BufferError::TooLarge);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

impl Handler for BufferBody {
    fn call(&self, stream: Stream, headers: Headers, mut params: Params, next: Next) -> HandlerFuture {
        let inner = Arc::clone(&self.inner);
        let limits = self.limits;

        Box::pin(async move {
            let read = tokio::time::timeout(limits.timeout, read_body(&stream, limits.max_bytes)).await;
            match read {
                Ok(Ok(body)) => {
                    tracing::trace!(stream_id = %stream.id(), bytes = body.len(), "Request body buffered");
                    params.body = Some(body);
                    inner.call(stream, headers, params, next).await
                }
                Ok(Err(BufferError::TooLarge)) => {
                    tracing::warn!(
                        stream_id = %stream.id(),
                        max_bytes = limits.max_bytes,
                        "Request body exceeds limit"
                    );
                    plain_text(&stream, StatusCode::PAYLOAD_TOO_LARGE, "Payload too large.").map_err(Into::into)
                }
                Ok(Err(BufferError::Stream(e))) => {
                    tracing::warn!(stream_id = %stream.id(), error = %e, "Request body read failed");
                    plain_text(&stream, StatusCode::BAD_REQUEST, "Bad request body.").map_err(Into::into)
                }
                Err(_) => {
                    tracing::warn!(
                        stream_id = %stream.id(),
                        timeout = ?limits.timeout,
                        "Request body timed out"
                    );
                    plain_text(&stream, StatusCode::REQUEST_TIMEOUT, "Request timeout.").map_err(Into::into)
                }
            }
        })
    }
}
