//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! (stream, headers)
//!     → Router::dispatch
//!     → RouteTable::resolve (method + path, query parsed into params.get)
//!         → no match: 404 "Not found."
//!     → middleware snapshot empty?
//!         → yes: route handler with a finalizing `Next`
//!         → no:  chain.rs (middleware in order, then route handler)
//!     → next.rs renders the reply onto the stream
//! ```
//!
//! # Design Decisions
//! - Route table and middleware list are swapped atomically on registration;
//!   a request works on the snapshot it loaded, so late registrations never
//!   change an in-flight chain
//! - Handler errors become a 500 when nothing was sent yet

pub mod chain;
pub mod next;

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use hyper::{Method, StatusCode};

use crate::error::{HandlerError, RouteError};
use crate::handler::{compose, BodyLimits, BoxedHandler, Handler, HandlerOptions};
use crate::http::response::plain_text;
use crate::http::{Headers, Stream};
use crate::observability::metrics;
use crate::routing::{Lookup, RouteMatcher, RouteTable, RouteTree, SegmentTree};

pub use chain::ChainState;
pub use next::Next;

/// Registered routes and global middleware.
pub struct Router<M: RouteMatcher = SegmentTree> {
    routes: ArcSwap<RouteTable<M>>,
    middleware: ArcSwap<Vec<BoxedHandler>>,
    body_limits: BodyLimits,
}

impl Router<SegmentTree> {
    /// Create an empty router with default body limits.
    pub fn new() -> Self {
        Self::with_body_limits(BodyLimits::default())
    }
}

impl Default for Router<SegmentTree> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RouteMatcher> Router<M> {
    /// Create an empty router whose buffered routes default to `limits`.
    pub fn with_body_limits(limits: BodyLimits) -> Self {
        Self {
            routes: ArcSwap::from_pointee(RouteTable::default()),
            middleware: ArcSwap::from_pointee(Vec::new()),
            body_limits: limits,
        }
    }

    /// Register `handler` for `method` on `path`, applying `options` once.
    pub fn add(
        &self,
        path: &str,
        method: Method,
        handler: impl Handler,
        options: HandlerOptions,
    ) -> Result<(), RouteError> {
        self.add_boxed(path, method, Arc::new(handler), options)
    }

    fn add_boxed(
        &self,
        path: &str,
        method: Method,
        handler: BoxedHandler,
        options: HandlerOptions,
    ) -> Result<(), RouteError> {
        let handler = compose(handler, &options.or_limits(self.body_limits));

        let mut outcome = Ok(());
        self.routes.rcu(|current| {
            let mut table = RouteTable::clone(current);
            outcome = table.register(path, &method, Arc::clone(&handler));
            match outcome {
                Ok(()) => Arc::new(table),
                Err(_) => Arc::clone(current),
            }
        });
        if outcome.is_ok() {
            tracing::debug!(%method, path, buffer_body = options.buffer_body, "Route registered");
        }
        outcome
    }

    /// Register a GET handler.
    pub fn get(&self, path: &str, handler: impl Handler) -> Result<(), RouteError> {
        self.add(path, Method::GET, handler, HandlerOptions::default())
    }

    /// Register a POST handler.
    pub fn post(
        &self,
        path: &str,
        handler: impl Handler,
        options: HandlerOptions,
    ) -> Result<(), RouteError> {
        self.add(path, Method::POST, handler, options)
    }

    /// Register a PUT handler.
    pub fn put(
        &self,
        path: &str,
        handler: impl Handler,
        options: HandlerOptions,
    ) -> Result<(), RouteError> {
        self.add(path, Method::PUT, handler, options)
    }

    /// Register a DELETE handler.
    pub fn delete(
        &self,
        path: &str,
        handler: impl Handler,
        options: HandlerOptions,
    ) -> Result<(), RouteError> {
        self.add(path, Method::DELETE, handler, options)
    }

    /// Register every route of a nested route tree.
    ///
    /// Stops at the first error; routes registered before it stay registered.
    pub fn add_routes(&self, tree: RouteTree) -> Result<(), RouteError> {
        for entry in tree.flatten() {
            self.add_boxed(&entry.path, entry.method, entry.handler, entry.options)?;
        }
        Ok(())
    }

    /// Append a global middleware. Runs after every middleware already registered.
    pub fn use_middleware(&self, middleware: impl Handler) {
        let middleware: BoxedHandler = Arc::new(middleware);
        self.middleware.rcu(|current| {
            let mut list = Vec::clone(current);
            list.push(Arc::clone(&middleware));
            list
        });
    }

    /// Number of registered global middleware.
    pub fn middleware_count(&self) -> usize {
        self.middleware.load().len()
    }

    /// Resolve a `:path` value (path plus optional query) for `method`.
    pub fn resolve(&self, path: &str, method: &Method) -> Option<Lookup> {
        self.routes.load().resolve(path, method)
    }

    /// Handle one inbound stream to completion.
    ///
    /// Handler errors are logged and, when the response is still open,
    /// answered with 500.
    pub async fn dispatch(&self, stream: Stream, headers: Headers) {
        let start = Instant::now();
        if let Err(e) = self.route(stream.clone(), headers.clone()).await {
            tracing::error!(
                stream_id = %stream.id(),
                method = %headers.method(),
                path = headers.path(),
                error = %e,
                "Handler failed"
            );
            if !stream.is_finalized() {
                if let Err(e) = plain_text(
                    &stream,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.",
                ) {
                    tracing::warn!(stream_id = %stream.id(), error = %e, "Could not send 500");
                }
            }
        }
        tracing::trace!(stream_id = %stream.id(), elapsed = ?start.elapsed(), "Dispatch finished");
    }

    async fn route(&self, stream: Stream, headers: Headers) -> Result<(), HandlerError> {
        let method = headers.method().clone();
        let Some(lookup) = self.resolve(headers.path(), &method) else {
            tracing::debug!(stream_id = %stream.id(), %method, path = headers.path(), "No route matched");
            metrics::record_not_found();
            return Ok(plain_text(&stream, StatusCode::NOT_FOUND, "Not found.")?);
        };

        let middleware = self.middleware.load_full();
        if middleware.is_empty() {
            let next = Next::finalizing(stream.clone());
            lookup.handler.call(stream, headers, lookup.params, next).await
        } else {
            chain::Chain::new(&middleware, lookup.handler, stream, headers)
                .start(lookup.params)
                .await
        }
    }
}
