//! Per-provider statistics record.
//!
//! # Responsibilities
//! - Hold the lifetime counters, latency averages and breaker of one provider
//! - Apply one outcome at a time and report the breaker transition it caused
//! - Keep derived rates and the score consistent with the counters
//!
//! # Design Decisions
//! - Pure data plus pure mutation; locking lives in the registry
//! - Score is recomputed on every mutation, never lazily on read
//! - Counters never decrease and records are never deleted

use serde::{Deserialize, Serialize};

use crate::config::HealthConfig;
use crate::resilience::{CircuitBreaker, CircuitState, Transition};
use crate::selection::score;

/// Score given to a provider before any outcome was recorded.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Stable provider identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProviderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why an attempt failed. Every failure carries exactly one reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureReason {
    /// No response within the attempt deadline.
    Timeout,
    /// Non-2xx or transport-level rejection.
    Http,
    /// Body could not be parsed into the expected structure.
    Json,
    /// Parsed, but failed shape checks.
    Validation,
    /// Uncategorized.
    Unknown,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::Timeout => "timeout",
            FailureReason::Http => "http",
            FailureReason::Json => "json",
            FailureReason::Validation => "validation",
            FailureReason::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health record of one provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderStats {
    pub id: ProviderId,
    pub total: u64,
    pub success: u64,
    pub json_ok: u64,
    pub failure: u64,
    /// Failures that were terminal for their tier (not entitled, not found).
    pub terminal_failure: u64,
    pub last_latency_ms: Option<u64>,
    pub ema_latency_ms: Option<f64>,
    #[serde(flatten)]
    pub breaker: CircuitBreaker,
    pub last_error: Option<String>,
    pub last_failure_reason: Option<FailureReason>,
    pub score: f64,
    pub success_rate: f64,
    pub json_rate: f64,
}

impl ProviderStats {
    /// A fresh record: closed, zero counters, neutral score.
    pub fn new(id: ProviderId, config: &HealthConfig) -> Self {
        Self {
            id,
            total: 0,
            success: 0,
            json_ok: 0,
            failure: 0,
            terminal_failure: 0,
            last_latency_ms: None,
            ema_latency_ms: None,
            breaker: CircuitBreaker::new(config),
            last_error: None,
            last_failure_reason: None,
            score: NEUTRAL_SCORE,
            success_rate: 0.0,
            json_rate: 0.0,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.breaker.circuit_state
    }

    fn observe_latency(&mut self, latency_ms: u64, alpha: f64) {
        let sample = latency_ms as f64;
        self.last_latency_ms = Some(latency_ms);
        self.ema_latency_ms = Some(match self.ema_latency_ms {
            Some(ema) => alpha * sample + (1.0 - alpha) * ema,
            None => sample,
        });
    }

    /// Failures that count toward the trip rate.
    fn trip_failures(&self, config: &HealthConfig) -> u64 {
        if config.trip_on_terminal {
            self.failure
        } else {
            self.failure - self.terminal_failure
        }
    }

    /// Record a successful attempt.
    pub fn apply_success(
        &mut self,
        latency_ms: u64,
        output_valid: bool,
        config: &HealthConfig,
    ) -> Option<Transition> {
        self.total += 1;
        self.success += 1;
        if output_valid {
            self.json_ok += 1;
        }
        self.observe_latency(latency_ms, config.ema_alpha);
        self.last_error = None;

        let transition = self.breaker.on_success(config);
        self.recompute(config);
        transition
    }

    /// Record a failed attempt.
    pub fn apply_failure(
        &mut self,
        now: u64,
        latency_ms: Option<u64>,
        reason: FailureReason,
        message: String,
        terminal: bool,
        config: &HealthConfig,
    ) -> Option<Transition> {
        self.total += 1;
        self.failure += 1;
        if terminal {
            self.terminal_failure += 1;
        }
        if let Some(ms) = latency_ms {
            self.observe_latency(ms, config.ema_alpha);
        }
        self.last_failure_reason = Some(reason);
        self.last_error = Some(message);

        let advanced = self.breaker.advance(now, config);
        let transition = match self.breaker.circuit_state {
            CircuitState::HalfOpen => self.breaker.on_probe_failure(now, config),
            CircuitState::Closed => {
                if CircuitBreaker::should_trip(self.total, self.trip_failures(config), config) {
                    self.breaker.trip(now, config)
                } else {
                    None
                }
            }
            CircuitState::Open => None,
        };

        self.recompute(config);
        transition.or(advanced)
    }

    /// Refresh derived rates and the composite score.
    pub fn recompute(&mut self, config: &HealthConfig) {
        self.success_rate = if self.total > 0 {
            self.success as f64 / self.total as f64
        } else {
            0.0
        };
        self.json_rate = if self.success > 0 {
            self.json_ok as f64 / self.success as f64
        } else {
            0.0
        };
        self.score = score::compute(self, config);
    }

    /// Ask the breaker for admission at `now`, optionally taking the
    /// half-open probe. The score follows any state change it causes.
    pub fn admit(
        &mut self,
        now: u64,
        take_probe: bool,
        config: &HealthConfig,
    ) -> (bool, Option<Transition>) {
        let before = self.state();
        let (admitted, transition) = self.breaker.can_attempt(now, config);
        if admitted && take_probe {
            self.breaker.mark_probe_start();
        }
        if self.state() != before {
            self.recompute(config);
        }
        (admitted, transition)
    }

    /// Eligibility at `now` without mutating the record.
    pub fn eligible_at(&self, now: u64, config: &HealthConfig) -> bool {
        let mut breaker = self.breaker.clone();
        breaker.can_attempt(now, config).0
    }
}
