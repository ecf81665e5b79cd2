//! Registration-time handler options.
//!
//! Options are turned into decorators once, when a route is registered.
//! Decorators are applied in the order of [`DECORATORS`]; the first entry
//! wraps the user handler directly.

use std::sync::Arc;
use std::time::Duration;

use crate::handler::{BoxedHandler, BufferBody};

/// Bounds applied while buffering a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLimits {
    /// Largest accepted body in bytes.
    pub max_bytes: usize,
    /// Time allowed for the whole body to arrive.
    pub timeout: Duration,
}

impl Default for BodyLimits {
    fn default() -> Self {
        Self {
            max_bytes: 2 * 1024 * 1024, // 2MB
            timeout: Duration::from_secs(30),
        }
    }
}

/// Options accepted by `add`, `post`, `put` and `delete`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlerOptions {
    /// Accumulate the request body into `params.body` before the handler runs.
    pub buffer_body: bool,
    /// Per-route body limits. `None` uses the router's defaults.
    pub body_limits: Option<BodyLimits>,
}

impl HandlerOptions {
    /// Options with body buffering enabled.
    pub fn buffered() -> Self {
        Self {
            buffer_body: true,
            body_limits: None,
        }
    }

    /// Override the body limits for this route.
    pub fn with_body_limits(mut self, limits: BodyLimits) -> Self {
        self.body_limits = Some(limits);
        self
    }

    /// Fill in limits that were not set explicitly.
    pub(crate) fn or_limits(mut self, defaults: BodyLimits) -> Self {
        self.body_limits.get_or_insert(defaults);
        self
    }
}

/// A decorator the composer knows how to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decorator {
    BufferBody,
}

/// Application order. New decorators are appended here.
const DECORATORS: &[Decorator] = &[Decorator::BufferBody];

impl Decorator {
    fn enabled(self, options: &HandlerOptions) -> bool {
        match self {
            Decorator::BufferBody => options.buffer_body,
        }
    }

    fn apply(self, handler: BoxedHandler, options: &HandlerOptions) -> BoxedHandler {
        match self {
            Decorator::BufferBody => Arc::new(BufferBody::new(
                handler,
                options.body_limits.unwrap_or_default(),
            )),
        }
    }
}

/// Wrap `handler` with every decorator enabled in `options`.
///
/// Returns `handler` itself when nothing is enabled.
pub fn compose(handler: BoxedHandler, options: &HandlerOptions) -> BoxedHandler {
    DECORATORS
        .iter()
        .filter(|d| d.enabled(options))
        .fold(handler, |h, d| d.apply(h, options))
}
