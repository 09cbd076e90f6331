//! Metrics definitions for the Match Controller.
//!
//! All metrics follow Prometheus naming conventions:
//! - `mm_` prefix for the matchmaking service
//! - `_total` suffix for counters
//!
//! No labels are used; every metric has cardinality 1.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder and return the handle for
/// serving metrics via HTTP. Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns an error if the recorder fails to install (e.g. already
/// installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

/// Record one client arrival.
///
/// Metric: `mm_clients_arrived_total`
pub fn record_client_arrived() {
    counter!("mm_clients_arrived_total").increment(1);
}

/// Set the number of clients currently waiting in the queue.
///
/// Metric: `mm_clients_waiting`
pub fn set_clients_waiting(count: usize) {
    // usize to f64 conversion is safe for realistic queue depths (< 2^53)
    #[allow(clippy::cast_precision_loss)]
    gauge!("mm_clients_waiting").set(count as f64);
}

/// Record one formed pair.
///
/// Metric: `mm_pairs_formed_total`
pub fn record_pair_formed() {
    counter!("mm_pairs_formed_total").increment(1);
}

/// Record one failed provisioning call.
///
/// Metric: `mm_provision_failures_total`
pub fn record_provision_failure() {
    counter!("mm_provision_failures_total").increment(1);
}

/// Record one outcome message delivered to a live client.
///
/// Metric: `mm_outcomes_delivered_total`
pub fn record_outcome_delivered() {
    counter!("mm_outcomes_delivered_total").increment(1);
}

/// Record one outcome skipped because the client's connection was gone.
///
/// Metric: `mm_outcomes_skipped_total`
pub fn record_outcome_skipped() {
    counter!("mm_outcomes_skipped_total").increment(1);
}
