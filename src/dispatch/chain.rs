//! Middleware chain executor.
//!
//! # States
//! ```text
//! Pending  ──next.run()──▶ Pending      (more middleware remain)
//! Pending  ──next.run()──▶ Terminal     (last middleware popped)
//! Terminal ──next.run()──▶ Done         (route handler invoked with a finalizing next)
//! any      ──next.send()─▶ Done         (short-circuit, chain dropped)
//! ```
//!
//! # Design Decisions
//! - The chain owns a private copy of the middleware snapshot
//! - Exactly one link runs at a time; links advance by calling `next`
//! - The chain itself never finalizes; `Next` does

use std::collections::VecDeque;

use crate::dispatch::Next;
use crate::handler::{BoxedHandler, HandlerFuture};
use crate::http::{Headers, Stream};
use crate::routing::Params;

/// Position of a chain in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// Middleware remain to be run.
    Pending,
    /// No middleware remain; the route handler runs next.
    Terminal,
    /// The route handler was invoked or the chain was short-circuited.
    Done,
}

enum Link {
    Middleware(BoxedHandler),
    Terminal,
}

pub(crate) struct Chain {
    middleware: VecDeque<BoxedHandler>,
    handler: BoxedHandler,
    stream: Stream,
    headers: Headers,
    state: ChainState,
}

impl Chain {
    pub(crate) fn new(
        snapshot: &[BoxedHandler],
        handler: BoxedHandler,
        stream: Stream,
        headers: Headers,
    ) -> Self {
        let middleware: VecDeque<BoxedHandler> = snapshot.iter().cloned().collect();
        let state = if middleware.is_empty() {
            ChainState::Terminal
        } else {
            ChainState::Pending
        };
        Self {
            middleware,
            handler,
            stream,
            headers,
            state,
        }
    }

    pub(crate) fn state(&self) -> ChainState {
        self.state
    }

    pub(crate) fn remaining(&self) -> usize {
        self.middleware.len()
    }

    /// Seed the chain by invoking the first middleware.
    pub(crate) fn start(self, params: Params) -> HandlerFuture {
        tracing::trace!(
            stream_id = %self.stream.id(),
            middleware = self.middleware.len(),
            "Middleware chain started"
        );
        self.advance(params)
    }

    /// Invoke the next link: a middleware, or the route handler once none remain.
    pub(crate) fn advance(mut self, params: Params) -> HandlerFuture {
        match self.next_link() {
            Link::Middleware(link) => {
                let stream = self.stream.clone();
                let headers = self.headers.clone();
                let next = Next::chained(stream.clone(), self);
                link.call(stream, headers, params, next)
            }
            Link::Terminal => {
                let Chain {
                    handler,
                    stream,
                    headers,
                    ..
                } = self;
                let next = Next::finalizing(stream.clone());
                handler.call(stream, headers, params, next)
            }
        }
    }

    /// End the chain early, dropping the remaining links unrun.
    ///
    /// Returns how many middleware were skipped. The caller finalizes the
    /// response.
    pub(crate) fn short_circuit(self) -> usize {
        let skipped = self.middleware.len();
        tracing::debug!(
            stream_id = %self.stream.id(),
            from = ?self.state,
            skipped_middleware = skipped,
            "Middleware chain short-circuited"
        );
        skipped
    }

    fn next_link(&mut self) -> Link {
        match self.middleware.pop_front() {
            Some(link) => {
                if self.middleware.is_empty() {
                    self.state = ChainState::Terminal;
                }
                Link::Middleware(link)
            }
            None => {
                self.state = ChainState::Done;
                Link::Terminal
            }
        }
    }
}
