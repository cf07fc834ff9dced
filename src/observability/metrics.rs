//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sleeping_connection_attempts_total` (counter): intercepted attempts by platform
//! - `sleeping_wake_signals_total` (counter): wake callbacks fired by platform
//! - `sleeping_wake_failures_total` (counter): wake callbacks that panicked by platform
//! - `sleeping_disconnect_failures_total` (counter): disconnect/close faults by step
//! - `sleeping_tolerable_startup_faults_total` (counter): degraded startups

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with an HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_connection_attempt(platform: &'static str) {
    counter!("sleeping_connection_attempts_total", "platform" => platform).increment(1);
}

pub fn record_wake_signal(platform: &'static str) {
    counter!("sleeping_wake_signals_total", "platform" => platform).increment(1);
}

pub fn record_wake_failure(platform: &'static str) {
    counter!("sleeping_wake_failures_total", "platform" => platform).increment(1);
}

/// `step` is `disconnect` or `close`.
pub fn record_disconnect_failure(step: &'static str) {
    counter!("sleeping_disconnect_failures_total", "step" => step).increment(1);
}

pub fn record_tolerable_startup_fault() {
    counter!("sleeping_tolerable_startup_faults_total").increment(1);
}
