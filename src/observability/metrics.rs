//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define server metrics (requests, latency, 404s, connections)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `simple_h2_requests_total` (counter): completed streams by method, status
//!   (extension methods are labelled `OTHER`)
//! - `simple_h2_not_found_total` (counter): streams that matched no route
//! - `simple_h2_request_duration_seconds` (histogram): stream latency
//! - `simple_h2_active_connections` (gauge): current connection count

use std::net::SocketAddr;
use std::time::Instant;

use hyper::Method;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "simple_h2_requests_total";
pub const NOT_FOUND_TOTAL: &str = "simple_h2_not_found_total";
pub const REQUEST_DURATION: &str = "simple_h2_request_duration_seconds";
pub const ACTIVE_CONNECTIONS: &str = "simple_h2_active_connections";

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a completed stream.
pub fn record_request(method: &Method, status: u16, start: Instant) {
    let method = method_label(method);
    counter!(REQUESTS_TOTAL, "method" => method, "status" => status.to_string()).increment(1);
    histogram!(REQUEST_DURATION, "method" => method).record(start.elapsed().as_secs_f64());
}

/// Label value for `method`. Extension methods share one series.
fn method_label(method: &Method) -> &'static str {
    match method.as_str() {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        "OPTIONS" => "OPTIONS",
        "CONNECT" => "CONNECT",
        "TRACE" => "TRACE",
        _ => "OTHER",
    }
}

pub fn record_not_found() {
    counter!(NOT_FOUND_TOTAL).increment(1);
}

pub fn connection_opened() {
    gauge!(ACTIVE_CONNECTIONS).increment(1.0);
}

pub fn connection_closed() {
    gauge!(ACTIVE_CONNECTIONS).decrement(1.0);
}
