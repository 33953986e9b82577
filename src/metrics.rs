//! Prometheus metrics for scan throughput and latency.
//!
//! This module provides metrics for:
//! - Quotes ingested and dropped (by reason)
//! - Groups evaluated and discarded as incomplete
//! - Opportunities detected and degenerate allocations
//! - Scan and HTTP request latency

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Scan latency metric name.
pub const METRIC_SCAN_LATENCY: &str = "scan_latency_ms";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Quotes ingested counter metric name.
pub const METRIC_QUOTES_INGESTED: &str = "quotes_ingested_total";
/// Quotes dropped counter metric name.
pub const METRIC_QUOTES_DROPPED: &str = "quotes_dropped_total";
/// Groups evaluated counter metric name.
pub const METRIC_GROUPS_EVALUATED: &str = "groups_evaluated_total";
/// Incomplete groups counter metric name.
pub const METRIC_GROUPS_INCOMPLETE: &str = "groups_incomplete_total";
/// Opportunities detected counter metric name.
pub const METRIC_OPPORTUNITIES_DETECTED: &str = "opportunities_detected_total";
/// Degenerate allocations counter metric name.
pub const METRIC_DEGENERATE_ALLOCATIONS: &str = "degenerate_allocations_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    // Latency histograms
    describe_histogram!(
        METRIC_SCAN_LATENCY,
        "Time to scan one quote batch in milliseconds"
    );
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );

    // Counters
    describe_counter!(METRIC_QUOTES_INGESTED, "Total number of quotes ingested");
    describe_counter!(
        METRIC_QUOTES_DROPPED,
        "Total number of quotes dropped before evaluation"
    );
    describe_counter!(
        METRIC_GROUPS_EVALUATED,
        "Total number of complete outcome groups evaluated"
    );
    describe_counter!(
        METRIC_GROUPS_INCOMPLETE,
        "Total number of outcome groups missing a side"
    );
    describe_counter!(
        METRIC_OPPORTUNITIES_DETECTED,
        "Total number of arbitrage opportunities detected"
    );
    describe_counter!(
        METRIC_DEGENERATE_ALLOCATIONS,
        "Total number of opportunities whose stakes rounded to zero"
    );

    debug!("Metrics initialized");
}

/// Install the global Prometheus recorder and describe all metrics.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}

/// Add to quotes ingested counter.
pub fn inc_quotes_ingested(count: usize) {
    counter!(METRIC_QUOTES_INGESTED).increment(count as u64);
}

/// Increment quotes dropped counter.
pub fn inc_quotes_dropped(reason: &str) {
    counter!(METRIC_QUOTES_DROPPED, "reason" => reason.to_string()).increment(1);
}

/// Add to groups evaluated counter.
pub fn inc_groups_evaluated(count: usize) {
    counter!(METRIC_GROUPS_EVALUATED).increment(count as u64);
}

/// Add to incomplete groups counter.
pub fn inc_groups_incomplete(count: usize) {
    counter!(METRIC_GROUPS_INCOMPLETE).increment(count as u64);
}

/// Increment opportunities detected counter.
pub fn inc_opportunities_detected(sport: &str) {
    counter!(METRIC_OPPORTUNITIES_DETECTED, "sport" => sport.to_string()).increment(1);
}

/// Increment degenerate allocations counter.
pub fn inc_degenerate_allocations() {
    counter!(METRIC_DEGENERATE_ALLOCATIONS).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for one batch scan.
pub fn timer_scan() -> LatencyTimer {
    LatencyTimer::new(METRIC_SCAN_LATENCY)
}
