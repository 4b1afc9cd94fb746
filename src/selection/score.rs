//! Composite provider fitness.
//!
//! ```text
//! score = clamp01(w_avail·success_rate + w_json·json_rate + w_lat·latency_fitness)
//!         − circuit_penalty
//! ```
//!
//! The penalty keeps troubled providers rankable but disfavored; the final
//! value is floored at zero so the score always stays within 0..=1.

use crate::config::HealthConfig;
use crate::health::ProviderStats;
use crate::resilience::CircuitState;

/// Latency fitness used before any latency was measured.
pub const NEUTRAL_LATENCY_FITNESS: f64 = 0.5;

/// `1 / (1 + ms / target)`, or neutral when latency is unknown.
pub fn latency_fitness(latency_ms: Option<f64>, target_ms: u64) -> f64 {
    match latency_ms {
        Some(ms) if target_ms > 0 => 1.0 / (1.0 + ms.max(0.0) / target_ms as f64),
        _ => NEUTRAL_LATENCY_FITNESS,
    }
}

pub fn circuit_penalty(state: CircuitState) -> f64 {
    match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 0.10,
        CircuitState::Open => 0.25,
    }
}

fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Score a provider from its current counters and breaker state.
pub fn compute(stats: &ProviderStats, config: &HealthConfig) -> f64 {
    let raw = config.weight_availability * stats.success_rate
        + config.weight_json * stats.json_rate
        + config.weight_latency * latency_fitness(stats.ema_latency_ms, config.target_latency_ms);

    (clamp01(raw) - circuit_penalty(stats.state())).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::FailureReason;

    #[test]
    fn test_latency_fitness() {
        assert_eq!(latency_fitness(None, 4_000), 0.5);
        assert_eq!(latency_fitness(Some(0.0), 4_000), 1.0);
        assert_eq!(latency_fitness(Some(4_000.0), 4_000), 0.5);
        assert!((latency_fitness(Some(12_000.0), 4_000) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_fast_provider() {
        let config = HealthConfig::default();
        let mut stats = ProviderStats::new("fast".into(), &config);
        stats.apply_success(0, true, &config);
        assert!((stats.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_penalty_applies_per_state() {
        let config = HealthConfig::default();
        let mut stats = ProviderStats::new("p".into(), &config);
        stats.apply_success(4_000, true, &config);
        // 0.55 + 0.30 + 0.15 * 0.5
        let closed = stats.score;
        assert!((closed - 0.925).abs() < 1e-9);

        stats.breaker.circuit_state = CircuitState::HalfOpen;
        assert!((compute(&stats, &config) - 0.825).abs() < 1e-9);
        stats.breaker.circuit_state = CircuitState::Open;
        assert!((compute(&stats, &config) - 0.675).abs() < 1e-9);
    }

    #[test]
    fn test_score_never_negative() {
        let config = HealthConfig::default();
        let mut stats = ProviderStats::new("dead".into(), &config);
        for _ in 0..config.min_requests {
            stats.apply_failure(0, Some(60_000), FailureReason::Timeout, "t".into(), false, &config);
        }
        assert_eq!(stats.state(), CircuitState::Open);
        assert_eq!(stats.score, 0.0);
    }
}
