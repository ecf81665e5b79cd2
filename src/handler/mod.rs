//! Handler abstraction shared by routes and middleware.
//!
//! # Data Flow
//! ```text
//! Registration:
//!     user handler
//!     → options.rs (compose decorators in declared order)
//!     → buffer.rs (optional: accumulate request body first)
//!     → BoxedHandler stored in the route table
//!
//! Per request:
//!     (stream, headers, params, next)
//!     → handler decides: finish via `next`, finish on the stream, or continue
//! ```
//!
//! # Design Decisions
//! - Routes and middleware share one signature
//! - Arguments are owned so futures are `'static` and can be spawned
//! - Plain `async fn`s with the full signature implement `Handler` directly;
//!   closures go through [`handler_fn`] so their argument types are inferred

pub mod buffer;
pub mod options;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::dispatch::Next;
use crate::error::HandlerError;
use crate::http::{Headers, Stream};
use crate::routing::Params;

pub use buffer::BufferBody;
pub use options::{compose, BodyLimits, HandlerOptions};

/// Future returned by a handler invocation.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send + 'static>>;

/// Shared, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// A route handler or middleware.
pub trait Handler: Send + Sync + 'static {
    /// Process one request. The handler either finalizes the response
    /// (through `next` or directly on `stream`) or hands control onward
    /// with [`Next::run`].
    fn call(&self, stream: Stream, headers: Headers, params: Params, next: Next) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(Stream, Headers, Params, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn call(&self, stream: Stream, headers: Headers, params: Params, next: Next) -> HandlerFuture {
        Box::pin(self(stream, headers, params, next))
    }
}

/// Handler built from a closure by [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Turn a closure into a [`Handler`].
///
/// ```ignore
/// router.get("/hello", handler_fn(|_stream, _headers, _params, next| async move {
///     next.send("Hello, world!")
/// }))?;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Stream, Headers, Params, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    HandlerFn { f }
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Stream, Headers, Params, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn call(&self, stream: Stream, headers: Headers, params: Params, next: Next) -> HandlerFuture {
        Box::pin((self.f)(stream, headers, params, next))
    }
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}
