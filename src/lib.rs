//! Minimal HTTP/2 router.
//!
//! Routes are registered per method and path pattern; global middleware runs
//! before the matched handler, and every handler finishes or hands off through
//! a [`Next`] continuation.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use dispatch::{Next, Router};
pub use error::{HandlerError, RouteError, ServerError, StreamError};
pub use handler::{handler_fn, Handler, HandlerOptions};
pub use http::{Headers, Reply, Server, Stream};
pub use lifecycle::Shutdown;
pub use routing::{Params, RouteTree};
