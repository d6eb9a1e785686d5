//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_calls_total` (counter): calls by endpoint and outcome
//! - `balancer_call_latency_ms` (histogram): recorded latency per endpoint
//! - `balancer_selections_total` (counter): selections by endpoint and mode
//! - `balancer_endpoint_score` (gauge): last computed score per endpoint
//! - `balancer_circuit_open` (gauge): 1=open, 0=closed
//!
//! Every call is a no-op until a recorder is installed.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::load_balancer::SelectionMode;
use crate::stats::EndpointId;

/// Install the Prometheus recorder globally and return a handle for rendering.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("Prometheus metrics recorder installed");
    Ok(handle)
}

pub fn record_call(endpoint: EndpointId, success: bool, latency_ms: f64) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "balancer_calls_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("balancer_call_latency_ms", "endpoint" => endpoint.to_string()).record(latency_ms);
}

pub fn record_selection(endpoint: EndpointId, mode: SelectionMode) {
    counter!(
        "balancer_selections_total",
        "endpoint" => endpoint.to_string(),
        "mode" => mode.as_str()
    )
    .increment(1);
}

pub fn record_score(endpoint: EndpointId, score: f64) {
    gauge!("balancer_endpoint_score", "endpoint" => endpoint.to_string()).set(score);
}

pub fn record_circuit_state(endpoint: EndpointId, open: bool) {
    gauge!("balancer_circuit_open", "endpoint" => endpoint.to_string())
        .set(if open { 1.0 } else { 0.0 });
}
