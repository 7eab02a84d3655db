//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): gated responses by status
//! - `gateway_rate_limited_total` (counter): rejections by policy
//! - `gateway_security_events_total` (counter): events by type

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_gated(status: u16) {
    metrics::counter!("gateway_requests_total", "status" => status.to_string()).increment(1);
}

pub fn record_rate_limited(policy: &str) {
    metrics::counter!("gateway_rate_limited_total", "policy" => policy.to_string()).increment(1);
}

pub fn record_security_event(event: &str) {
    metrics::counter!("gateway_security_events_total", "event" => event.to_string()).increment(1);
}
