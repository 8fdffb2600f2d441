//! # Consensus Metrics
//!
//! Prometheus metrics for monitoring the consensus core.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! tc-consensus = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `consensus_proposals_accepted_total` - Counter of applied transitions
//! - `consensus_proposals_rejected_total` - Counter of rejections (by check)
//! - `consensus_lib_height` - Gauge of the confirmed irreversible height
//! - `consensus_secret_reveals_total` - Counter of threshold reconstructions

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter_vec, register_int_counter, register_int_gauge, CounterVec, IntCounter,
    IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total transitions accepted and applied, labeled by behaviour
    pub static ref PROPOSALS_ACCEPTED: CounterVec = register_counter_vec!(
        "consensus_proposals_accepted_total",
        "Total number of round transitions accepted",
        &["behaviour"]
    )
    .expect("Failed to create PROPOSALS_ACCEPTED metric");

    /// Total proposals rejected, labeled by the failing check
    pub static ref PROPOSALS_REJECTED: CounterVec = register_counter_vec!(
        "consensus_proposals_rejected_total",
        "Total number of round transitions rejected",
        &["check"]
    )
    .expect("Failed to create PROPOSALS_REJECTED metric");

    /// Confirmed irreversible block height
    pub static ref LIB_HEIGHT: IntGauge = register_int_gauge!(
        "consensus_lib_height",
        "Confirmed irreversible block height"
    )
    .expect("Failed to create LIB_HEIGHT metric");

    /// Total secrets recovered via threshold reconstruction
    pub static ref SECRET_REVEALS: IntCounter = register_int_counter!(
        "consensus_secret_reveals_total",
        "Total number of secrets recovered from shares"
    )
    .expect("Failed to create SECRET_REVEALS metric");
}

/// Record an accepted transition
#[cfg(feature = "metrics")]
pub fn record_proposal_accepted(behaviour: &str) {
    PROPOSALS_ACCEPTED.with_label_values(&[behaviour]).inc();
}

/// Record a rejected proposal with the failing check
#[cfg(feature = "metrics")]
pub fn record_proposal_rejected(check: &str) {
    PROPOSALS_REJECTED.with_label_values(&[check]).inc();
}

/// Record the confirmed LIB height
#[cfg(feature = "metrics")]
pub fn record_lib_height(height: u64) {
    LIB_HEIGHT.set(height as i64);
}

/// Record threshold-reconstructed secrets
#[cfg(feature = "metrics")]
pub fn record_secret_reveals(count: u64) {
    SECRET_REVEALS.inc_by(count);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_proposal_accepted(_behaviour: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_proposal_rejected(_check: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_lib_height(_height: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_secret_reveals(_count: u64) {}
