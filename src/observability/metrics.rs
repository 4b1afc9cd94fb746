//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_attempts_total` (counter): attempts by provider and outcome
//! - `router_attempt_duration_seconds` (histogram): attempt latency by provider
//! - `router_circuit_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `router_provider_score` (gauge): composite fitness by provider
//! - `router_tier_fallthrough_total` (counter): tiers given up on, by tier
//! - `router_chain_total` (counter): chain executions by outcome
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - Labels are provider ids and tier names, never query content

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::CircuitState;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one attempt outcome (`success` or a failure reason).
pub fn record_attempt(provider: &str, outcome: &'static str, latency_ms: Option<u64>) {
    metrics::counter!(
        "router_attempts_total",
        "provider" => provider.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    if let Some(ms) = latency_ms {
        metrics::histogram!(
            "router_attempt_duration_seconds",
            "provider" => provider.to_string()
        )
        .record(ms as f64 / 1_000.0);
    }
}

/// Publish breaker state and score after a mutation.
pub fn record_provider_health(provider: &str, state: CircuitState, score: f64) {
    metrics::gauge!("router_circuit_state", "provider" => provider.to_string())
        .set(state.as_gauge());
    metrics::gauge!("router_provider_score", "provider" => provider.to_string()).set(score);
}

pub fn record_tier_fallthrough(tier: &str) {
    metrics::counter!("router_tier_fallthrough_total", "tier" => tier.to_string()).increment(1);
}

pub fn record_chain(outcome: &'static str) {
    metrics::counter!("router_chain_total", "outcome" => outcome).increment(1);
}
