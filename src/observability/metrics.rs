//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, upstream host
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `proxy_denied_total` (counter): policy denials by reason
//! - `proxy_upstream_failures_total` (counter): failed upstream exchanges
//! - `proxy_policy_errors_total` (counter): access checks that could not be evaluated
//! - `proxy_response_bodies_total` (counter): responses by body mode (text, stream)
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => {
            describe();
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

fn describe() {
    describe_counter!("proxy_requests_total", "Requests handled by the proxy");
    describe_histogram!(
        "proxy_request_duration_seconds",
        "Time from request arrival to response headers"
    );
    describe_counter!("proxy_denied_total", "Requests denied by access policy");
    describe_counter!("proxy_upstream_failures_total", "Upstream exchanges that failed");
    describe_counter!(
        "proxy_policy_errors_total",
        "Requests rejected because a policy pattern could not be evaluated"
    );
    describe_counter!("proxy_response_bodies_total", "Proxied responses by body handling mode");
}

pub fn record_request(method: &str, status: u16, upstream: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("upstream", upstream.to_string()),
    ];
    counter!("proxy_requests_total", &labels).increment(1);
    histogram!("proxy_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_denied(reason: &'static str) {
    counter!("proxy_denied_total", "reason" => reason).increment(1);
}

pub fn record_upstream_failure() {
    counter!("proxy_upstream_failures_total").increment(1);
}

pub fn record_policy_error() {
    counter!("proxy_policy_errors_total").increment(1);
}

pub fn record_body_mode(mode: &'static str) {
    counter!("proxy_response_bodies_total", "mode" => mode).increment(1);
}
