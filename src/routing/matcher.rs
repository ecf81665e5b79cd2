//! Path matching.
//!
//! # Responsibilities
//! - Store handlers per (pattern, method)
//! - Match a request path against stored patterns
//! - Capture `:name` segments
//!
//! # Design Decisions
//! - Segment tree: each node has literal children and at most one parameter child
//! - Literal children are tried first; on a dead end the parameter child is tried
//! - Empty segments are ignored, so trailing slashes are insignificant
//! - Path captures are returned as written (no percent-decoding)

use std::collections::HashMap;

use hyper::Method;

use crate::error::RouteError;
use crate::handler::BoxedHandler;

/// Result of a successful match.
pub struct Match {
    pub handler: BoxedHandler,
    pub captures: HashMap<String, String>,
}

/// A path-matching structure usable behind [`RouteTable`](crate::routing::RouteTable).
pub trait RouteMatcher: Clone + Default + Send + Sync + 'static {
    /// Store `handler` for `pattern` and `method`.
    fn add(&mut self, pattern: &str, method: &Method, handler: BoxedHandler) -> Result<(), RouteError>;

    /// Find the handler for `path` (no query string) and `method`.
    fn lookup(&self, path: &str, method: &Method) -> Option<Match>;
}

/// Segment tree matcher supporting literal and `:name` segments.
#[derive(Clone, Default)]
pub struct SegmentTree {
    root: Node,
}

#[derive(Clone, Default)]
struct Node {
    literals: HashMap<String, Node>,
    param: Option<(String, Box<Node>)>,
    handlers: HashMap<Method, BoxedHandler>,
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

impl RouteMatcher for SegmentTree {
    fn add(&mut self, pattern: &str, method: &Method, handler: BoxedHandler) -> Result<(), RouteError> {
        if !pattern.starts_with('/') {
            return Err(RouteError::InvalidPattern(pattern.to_string()));
        }

        let mut node = &mut self.root;
        for segment in segments(pattern) {
            node = match segment.strip_prefix(':') {
                Some("") => return Err(RouteError::InvalidPattern(pattern.to_string())),
                Some(name) => {
                    let (existing, child) = node
                        .param
                        .get_or_insert_with(|| (name.to_string(), Box::default()));
                    if existing.as_str() != name {
                        return Err(RouteError::ConflictingParam {
                            pattern: pattern.to_string(),
                            existing: existing.clone(),
                            new: name.to_string(),
                        });
                    }
                    &mut **child
                }
                None => node.literals.entry(segment.to_string()).or_default(),
            };
        }

        if node.handlers.contains_key(method) {
            return Err(RouteError::Duplicate {
                pattern: pattern.to_string(),
                method: method.to_string(),
            });
        }
        node.handlers.insert(method.clone(), handler);
        Ok(())
    }

    fn lookup(&self, path: &str, method: &Method) -> Option<Match> {
        let parts: Vec<&str> = segments(path).collect();
        let mut captures = Vec::new();
        let handler = find(&self.root, &parts, method, &mut captures)?;
        Some(Match {
            handler: handler.clone(),
            captures: captures
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }
}

fn find<'a>(
    node: &'a Node,
    parts: &[&'a str],
    method: &Method,
    captures: &mut Vec<(&'a str, &'a str)>,
) -> Option<&'a BoxedHandler> {
    let Some((first, rest)) = parts.split_first() else {
        return node.handlers.get(method);
    };

    if let Some(child) = node.literals.get(*first) {
        if let Some(handler) = find(child, rest, method, captures) {
            return Some(handler);
        }
    }

    if let Some((name, child)) = &node.param {
        captures.push((name.as_str(), *first));
        if let Some(handler) = find(child, rest, method, captures) {
            return Some(handler);
        }
        captures.pop();
    }

    None
}
