//! Nested route trees for bulk registration.
//!
//! A tree node carries a path prefix, handlers for some methods, and child
//! nodes. Children inherit their ancestors' prefixes:
//!
//! ```text
//! /hello            GET
//! /branch
//!     /leafA        GET   → /branch/leafA
//!     /leafB        GET   → /branch/leafB
//! ```

use std::sync::Arc;

use hyper::Method;

use crate::handler::{BoxedHandler, Handler, HandlerOptions};

/// One node of a route tree.
#[derive(Default)]
pub struct RouteTree {
    prefix: String,
    methods: Vec<(Method, BoxedHandler, HandlerOptions)>,
    children: Vec<RouteTree>,
}

/// A flattened route ready for registration.
pub struct RouteEntry {
    pub path: String,
    pub method: Method,
    pub handler: BoxedHandler,
    pub options: HandlerOptions,
}

impl RouteTree {
    /// A tree with no prefix, used as the root.
    pub fn root() -> Self {
        Self::default()
    }

    /// A node whose routes live under `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Handle `method` at this node's path.
    pub fn route(self, method: Method, handler: impl Handler) -> Self {
        self.route_with(method, handler, HandlerOptions::default())
    }

    /// Handle `method` at this node's path with handler options.
    pub fn route_with(mut self, method: Method, handler: impl Handler, options: HandlerOptions) -> Self {
        self.methods.push((method, Arc::new(handler), options));
        self
    }

    /// Attach a child node.
    pub fn branch(mut self, child: RouteTree) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first list of routes, parents before children, in insertion order.
    pub fn flatten(self) -> Vec<RouteEntry> {
        let mut entries = Vec::new();
        self.collect_into("", &mut entries);
        entries
    }

    fn collect_into(self, parent: &str, entries: &mut Vec<RouteEntry>) {
        let path = join(parent, &self.prefix);
        for (method, handler, options) in self.methods {
            entries.push(RouteEntry {
                path: if path.is_empty() { "/".to_string() } else { path.clone() },
                method,
                handler,
                options,
            });
        }
        for child in self.children {
            child.collect_into(&path, entries);
        }
    }
}

fn join(parent: &str, prefix: &str) -> String {
    let parent = parent.trim_end_matches('/');
    match prefix.trim_start_matches('/') {
        "" => parent.to_string(),
        rest => format!("{parent}/{rest}"),
    }
}
