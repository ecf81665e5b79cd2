//! Route table facade.
//!
//! # Responsibilities
//! - Normalize method tokens to uppercase
//! - Split `:path` into path and query string
//! - Build fresh `Params` for each successful lookup
//!
//! # Design Decisions
//! - Query parsing happens at lookup time, never at registration
//! - Immutable once shared; registration works on a clone that is swapped in

use std::collections::HashMap;

use hyper::Method;
use url::form_urlencoded;

use crate::error::RouteError;
use crate::handler::BoxedHandler;
use crate::routing::{Params, RouteMatcher, SegmentTree};

/// A resolved route.
pub struct Lookup {
    /// Handler stored for the route, decorators included.
    pub handler: BoxedHandler,
    /// Fresh params with path captures and query pairs.
    pub params: Params,
}

impl std::fmt::Debug for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lookup").field("params", &self.params).finish_non_exhaustive()
    }
}

/// Routes keyed by pattern and method.
#[derive(Clone, Default)]
pub struct RouteTable<M = SegmentTree> {
    matcher: M,
    len: usize,
}

fn normalize(method: &Method) -> Method {
    let token = method.as_str();
    if token.bytes().any(|b| b.is_ascii_lowercase()) {
        Method::from_bytes(token.to_ascii_uppercase().as_bytes()).unwrap_or_else(|_| method.clone())
    } else {
        method.clone()
    }
}

/// Parse a query string into key/value pairs. A repeated key keeps its last value.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

impl<M: RouteMatcher> RouteTable<M> {
    /// Store `handler` under `pattern` and the uppercased `method`.
    pub fn register(&mut self, pattern: &str, method: &Method, handler: BoxedHandler) -> Result<(), RouteError> {
        self.matcher.add(pattern, &normalize(method), handler)?;
        self.len += 1;
        Ok(())
    }

    /// Resolve a request path (optionally carrying a query string) for `method`.
    pub fn resolve(&self, request_path: &str, method: &Method) -> Option<Lookup> {
        let (path, query) = match request_path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (request_path, None),
        };

        let found = self.matcher.lookup(path, &normalize(method))?;
        Some(Lookup {
            handler: found.handler,
            params: Params {
                path: found.captures,
                get: query.map(parse_query).unwrap_or_default(),
                body: None,
            },
        })
    }

    /// Number of registered (pattern, method) pairs.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
