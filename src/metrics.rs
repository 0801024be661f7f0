//! Metric helpers for `sni_peek`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! every helper compiles to a no-op.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the counter tracking finished inspections, labelled by outcome.
pub const INSPECTIONS_TOTAL: &str = "sni_peek_inspections_total";
/// Name of the counter tracking fast-path verdicts.
pub const FAST_PATH_TOTAL: &str = "sni_peek_fast_path_total";
/// Name of the gauge tracking pool regions currently on loan.
pub const POOL_OUTSTANDING: &str = "sni_peek_pool_outstanding";
/// Name of the gauge tracking connections handled by the demo server.
pub const CONNECTIONS_ACTIVE: &str = "sni_peek_connections_active";

/// Record a finished inspection. `outcome` is `"ok"` or an error label.
#[cfg(feature = "metrics")]
pub fn inc_inspections(outcome: &'static str) {
    counter!(INSPECTIONS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a finished inspection. `outcome` is `"ok"` or an error label.
#[cfg(not(feature = "metrics"))]
pub fn inc_inspections(_outcome: &'static str) {}

/// Record the verdict reached by the fast path.
#[cfg(feature = "metrics")]
pub fn inc_fast_path(verdict: &'static str) {
    counter!(FAST_PATH_TOTAL, "verdict" => verdict).increment(1);
}

/// Record the verdict reached by the fast path.
#[cfg(not(feature = "metrics"))]
pub fn inc_fast_path(_verdict: &'static str) {}

/// Increment the outstanding pool regions gauge.
#[cfg(feature = "metrics")]
pub fn inc_pool_outstanding() { gauge!(POOL_OUTSTANDING).increment(1.0); }

/// Increment the outstanding pool regions gauge.
#[cfg(not(feature = "metrics"))]
pub fn inc_pool_outstanding() {}

/// Decrement the outstanding pool regions gauge.
#[cfg(feature = "metrics")]
pub fn dec_pool_outstanding() { gauge!(POOL_OUTSTANDING).decrement(1.0); }

/// Decrement the outstanding pool regions gauge.
#[cfg(not(feature = "metrics"))]
pub fn dec_pool_outstanding() {}

/// Increment the active connections gauge.
#[cfg(feature = "metrics")]
pub fn inc_connections() { gauge!(CONNECTIONS_ACTIVE).increment(1.0); }

/// Increment the active connections gauge.
#[cfg(not(feature = "metrics"))]
pub fn inc_connections() {}

/// Decrement the active connections gauge.
#[cfg(feature = "metrics")]
pub fn dec_connections() { gauge!(CONNECTIONS_ACTIVE).decrement(1.0); }

/// Decrement the active connections gauge.
#[cfg(not(feature = "metrics"))]
pub fn dec_connections() {}
