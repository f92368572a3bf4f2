//! HTTP server exposing the casino ledger.
//!
//! - [`api`]: Axum router, handlers and middleware
//! - [`config`]: Environment-driven server configuration
//! - [`logging`]: Tracing subscriber setup and structured log helpers
//! - [`metrics`]: Prometheus counters and histograms

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
