//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration:
//!     (pattern, method, handler)
//!     → table.rs (uppercase method, delegate to matcher)
//!     → matcher.rs (segment tree: literal and `:param` segments)
//!
//! Incoming `:path`:
//!     → table.rs (split path / query, parse query into params.get)
//!     → matcher.rs (walk segments, capture params.path)
//!     → Return: Lookup { handler, params } or None
//! ```
//!
//! # Design Decisions
//! - Methods are not merged: a path registered for GET is not found for POST
//! - Literal segments win over parameters, with backtracking
//! - Deterministic: same input against the same table yields the same match
//! - The matcher is pluggable behind `RouteMatcher`

pub mod matcher;
pub mod params;
pub mod table;
pub mod tree;

pub use matcher::{Match, RouteMatcher, SegmentTree};
pub use params::Params;
pub use table::{Lookup, RouteTable};
pub use tree::{RouteEntry, RouteTree};
