//! Error types shared across subsystems.
//!
//! # Design Decisions
//! - Registration problems surface as `RouteError` at startup, never per request
//! - Handler failures are values (`HandlerError`), converted to a 500 by the dispatcher
//! - Transport failures stay in the server loop and are only logged

use thiserror::Error;

/// Boxed error used as the source of handler failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while registering routes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// Pattern does not start with `/` or contains an empty parameter name.
    #[error("invalid route pattern `{0}`")]
    InvalidPattern(String),

    /// The same pattern and method were registered twice.
    #[error("route `{method} {pattern}` is already registered")]
    Duplicate { pattern: String, method: String },

    /// Two parameter segments with different names at the same position.
    #[error("parameter `:{new}` conflicts with existing `:{existing}` in `{pattern}`")]
    ConflictingParam {
        pattern: String,
        existing: String,
        new: String,
    },
}

/// Errors raised by a [`Stream`](crate::http::Stream) handle.
#[derive(Debug, Error)]
pub enum StreamError {
    /// `respond` or `end` was called after the response was already finalized.
    #[error("response already finalized")]
    AlreadyFinalized,

    /// `respond` was called twice before `end`.
    #[error("response headers already sent")]
    HeadersSent,

    /// The request body could not be read.
    #[error("failed to read request body: {0}")]
    Body(#[source] BoxError),
}

/// Failure reported by a handler or middleware.
#[derive(Debug, Error)]
#[error("handler failed: {source}")]
pub struct HandlerError {
    #[source]
    source: BoxError,
}

impl HandlerError {
    /// Wrap any error as a handler failure.
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl From<StreamError> for HandlerError {
    fn from(err: StreamError) -> Self {
        Self::new(err)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err)
    }
}

/// Errors raised while running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind listener: {0}")]
    Bind(#[source] std::io::Error),

    #[error("failed to load TLS configuration: {0}")]
    Tls(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
