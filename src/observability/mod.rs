//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Server, dispatcher, connections produce:
//!     → logging.rs (structured tracing events, per-stream spans)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (method, path, status, stream_id) over formatted text
//! - Every stream carries a UUID v4 id in its span
//! - Metrics are cheap (atomic increments); recording without an installed
//!   exporter is a no-op

pub mod logging;
pub mod metrics;
