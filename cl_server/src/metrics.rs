//! Prometheus metrics for monitoring ledger health.
//!
//! Metrics are exposed in Prometheus text format on a dedicated listener when
//! `METRICS_BIND` is configured. Without an installed recorder every call
//! here is a no-op.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use cl_server::metrics;
//! use std::net::SocketAddr;
//!
//! // Initialize metrics exporter
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! // Record a wager
//! metrics::wagers_total("slots", true);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Arguments
///
/// - `addr`: Address to bind the metrics server to (e.g., `0.0.0.0:9090`)
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Ledger Metrics
// ============================================================================

/// Record a ledger operation and its outcome code (`ok` or an error category code).
pub fn ledger_operations_total(operation: &'static str, outcome: &'static str) {
    metrics::counter!("ledger_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a settled wager.
pub fn wagers_total(game_type: &str, won: bool) {
    metrics::counter!("wagers_total",
        "game_type" => game_type.to_string(),
        "result" => if won { "win" } else { "lose" }
    )
    .increment(1);
}

/// Increment the counter of balance changes missing an audit entry.
pub fn reconciliation_required_total() {
    metrics::counter!("reconciliation_required_total").increment(1);
}
