//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define router metrics (requests by outcome, latency, cache efficiency)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `router_requests_total` (counter): dispatched requests by outcome
//! - `router_request_duration_seconds` (histogram): dispatch latency by outcome
//! - `router_cache_hits_total` / `router_cache_misses_total` (counters)
//! - `router_tree_nodes` (gauge): nodes in the route tree
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until a
//!   recorder is installed
//! - Outcome labels are a closed set: found, method_not_allowed, not_found

use std::net::SocketAddr;
use std::time::Instant;

use ::metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with an HTTP scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("router_requests_total", "Requests dispatched by the router");
    describe_histogram!(
        "router_request_duration_seconds",
        "Time spent dispatching a request"
    );
    describe_counter!("router_cache_hits_total", "Route cache hits");
    describe_counter!("router_cache_misses_total", "Route cache misses");
    describe_gauge!("router_tree_nodes", "Nodes in the route tree");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(outcome: &'static str, start: Instant) {
    counter!("router_requests_total", "outcome" => outcome).increment(1);
    histogram!("router_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    if hit {
        counter!("router_cache_hits_total").increment(1);
    } else {
        counter!("router_cache_misses_total").increment(1);
    }
}

pub fn record_tree_size(nodes: usize) {
    gauge!("router_tree_nodes").set(nodes as f64);
}
