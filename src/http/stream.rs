//! Per-request stream handle.
//!
//! # Responsibilities
//! - Expose the request body as ordered data chunks
//! - Collect the response head (`respond`) and body (`end`)
//! - Hand the finished response back to the transport exactly once
//!
//! # Design Decisions
//! - The handle is cloneable; all clones share one response slot
//! - A second `end` is rejected with `StreamError::AlreadyFinalized`
//! - Dropping every clone without finalizing closes the response channel,
//!   which the server treats as a handler bug (500)

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Body;
use hyper::{HeaderMap, Response, StatusCode};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::{BoxError, StreamError};

/// Type-erased request body.
pub type RequestBody = UnsyncBoxBody<Bytes, BoxError>;

/// Response produced by a finalized stream.
pub type WireResponse = Response<Full<Bytes>>;

/// Erase a body type so it can back a [`Stream`].
pub fn boxed<B>(body: B) -> RequestBody
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    body.map_err(Into::into).boxed_unsync()
}

/// One request/response exchange.
#[derive(Clone)]
pub struct Stream {
    inner: Arc<Inner>,
}

struct Inner {
    id: Uuid,
    body: tokio::sync::Mutex<RequestBody>,
    response: Mutex<ResponseSlot>,
}

struct ResponseSlot {
    head: Option<(StatusCode, HeaderMap)>,
    tx: Option<oneshot::Sender<WireResponse>>,
}

/// Receiving half of a stream's response slot, held by the transport.
#[derive(Debug)]
pub struct ResponseReceiver {
    rx: oneshot::Receiver<WireResponse>,
}

impl ResponseReceiver {
    /// Wait for the response. Returns `None` if every stream handle was
    /// dropped without finalizing.
    pub async fn recv(self) -> Option<WireResponse> {
        self.rx.await.ok()
    }
}

impl Stream {
    /// Create a stream over the given request body.
    pub fn new(body: RequestBody) -> (Self, ResponseReceiver) {
        let (tx, rx) = oneshot::channel();
        let stream = Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                body: tokio::sync::Mutex::new(body),
                response: Mutex::new(ResponseSlot {
                    head: None,
                    tx: Some(tx),
                }),
            }),
        };
        (stream, ResponseReceiver { rx })
    }

    /// Create a stream with an empty request body.
    pub fn empty() -> (Self, ResponseReceiver) {
        Self::new(boxed(Empty::<Bytes>::new()))
    }

    /// Unique id used to correlate log events for this stream.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Read the next data chunk of the request body.
    ///
    /// Returns `None` once the body has ended. Trailers are skipped.
    pub async fn data(&self) -> Option<Result<Bytes, StreamError>> {
        let mut body = self.inner.body.lock().await;
        loop {
            match body.frame().await? {
                Ok(frame) => {
                    if let Ok(chunk) = frame.into_data() {
                        return Some(Ok(chunk));
                    }
                }
                Err(e) => return Some(Err(StreamError::Body(e))),
            }
        }
    }

    /// Set the response status and headers. The body follows with [`end`](Self::end).
    pub fn respond(&self, status: StatusCode, headers: HeaderMap) -> Result<(), StreamError> {
        let mut slot = self.slot();
        if slot.tx.is_none() {
            return Err(StreamError::AlreadyFinalized);
        }
        if slot.head.is_some() {
            return Err(StreamError::HeadersSent);
        }
        slot.head = Some((status, headers));
        Ok(())
    }

    /// Finish the response with `body`. Without a prior `respond` the status is 200.
    pub fn end(&self, body: impl Into<Bytes>) -> Result<(), StreamError> {
        let (tx, head) = {
            let mut slot = self.slot();
            let tx = slot.tx.take().ok_or(StreamError::AlreadyFinalized)?;
            (tx, slot.head.take())
        };
        let (status, headers) = head.unwrap_or_else(|| (StatusCode::OK, HeaderMap::new()));

        let mut response = Response::new(Full::new(body.into()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;

        if tx.send(response).is_err() {
            tracing::debug!(stream_id = %self.inner.id, "Response dropped, peer went away");
        }
        Ok(())
    }

    /// Whether `end` has already been called on any clone of this stream.
    pub fn is_finalized(&self) -> bool {
        self.slot().tx.is_none()
    }

    fn slot(&self) -> MutexGuard<'_, ResponseSlot> {
        self.inner
            .response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("id", &self.inner.id)
            .field("finalized", &self.is_finalized())
            .finish()
    }
}
