//! Prometheus metrics for the mock server.
//!
//! Tracks mock traffic, simulated delays and listener lifecycle transitions.
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram, CounterVec, Encoder, Histogram, TextEncoder,
};
use tracing::warn;

lazy_static! {
    /// Requests served by the mock listener
    pub static ref MOCK_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "webtools_mock_requests_total",
        "Total number of requests served by the mock listener",
        &["status", "matched"]  // matched: true|false
    )
    .expect("mock request counter registers once");

    /// Simulated delay applied to matched rules
    pub static ref MOCK_DELAY_MS: Histogram = register_histogram!(
        "webtools_mock_delay_ms",
        "Histogram of configured endpoint delays in milliseconds",
        vec![10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]
    )
    .expect("mock delay histogram registers once");

    /// Listener lifecycle transitions
    pub static ref LIFECYCLE_EVENTS_TOTAL: CounterVec = register_counter_vec!(
        "webtools_mock_lifecycle_events_total",
        "Mock listener lifecycle transitions",
        &["event"]  // event: started|stopped|restarted|start_failed
    )
    .expect("lifecycle counter registers once");
}

/// Collect all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_mock_request(status: u16, matched: bool) {
    let status = status.to_string();
    let matched = if matched { "true" } else { "false" };
    MOCK_REQUESTS_TOTAL
        .with_label_values(&[status.as_str(), matched])
        .inc();
}

pub fn record_mock_delay(delay_ms: u64) {
    MOCK_DELAY_MS.observe(delay_ms as f64);
}

pub fn record_lifecycle_event(event: &str) {
    LIFECYCLE_EVENTS_TOTAL.with_label_values(&[event]).inc();
}
