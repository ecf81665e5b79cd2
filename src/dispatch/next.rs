//! The continuation handed to every handler.
//!
//! Calling conventions:
//! - [`Next::run`] with the params: continue. Inside a middleware chain this
//!   invokes the next middleware or the route handler; at the end of the
//!   chain (or without a chain) it finalizes with an empty body.
//! - [`Next::send`] with a value: finalize with that value now. Inside a
//!   chain the remaining middleware and the route handler are skipped.
//!
//! `Next` is consumed by either call, so a link cannot continue twice.

use crate::dispatch::chain::{Chain, ChainState};
use crate::error::HandlerError;
use crate::http::response::{finalize, Reply};
use crate::http::Stream;
use crate::routing::Params;

/// Continuation bound to one stream.
pub struct Next {
    stream: Stream,
    kind: Continuation,
}

enum Continuation {
    /// Finishes the response.
    Finalize,
    /// Advances a middleware chain.
    Chain(Chain),
}

impl Next {
    /// A continuation that finalizes `stream` directly.
    pub fn finalizing(stream: Stream) -> Self {
        Self {
            stream,
            kind: Continuation::Finalize,
        }
    }

    pub(crate) fn chained(stream: Stream, chain: Chain) -> Self {
        Self {
            stream,
            kind: Continuation::Chain(chain),
        }
    }

    /// Continue processing with `params`.
    pub async fn run(self, params: Params) -> Result<(), HandlerError> {
        match self.kind {
            Continuation::Finalize => Ok(finalize(&self.stream, Reply::Empty)?),
            Continuation::Chain(chain) => chain.advance(params).await,
        }
    }

    /// Finalize the response with `reply`, skipping anything left in the chain.
    pub fn send(self, reply: impl Into<Reply>) -> Result<(), HandlerError> {
        if let Continuation::Chain(chain) = self.kind {
            chain.short_circuit();
        }
        Ok(finalize(&self.stream, reply.into())?)
    }

    /// Number of middleware still waiting in this chain.
    pub fn pending_middleware(&self) -> usize {
        match &self.kind {
            Continuation::Finalize => 0,
            Continuation::Chain(chain) => chain.remaining(),
        }
    }

    /// State of the chain this continuation advances; `None` outside a chain.
    pub fn chain_state(&self) -> Option<ChainState> {
        match &self.kind {
            Continuation::Finalize => None,
            Continuation::Chain(chain) => Some(chain.state()),
        }
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("stream", &self.stream)
            .field("chain_state", &self.chain_state())
            .field("pending_middleware", &self.pending_middleware())
            .finish()
    }
}
