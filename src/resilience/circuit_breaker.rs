//! Circuit breaker for provider protection.
//!
//! # States
//! - Closed: normal operation, attempts pass through
//! - Open: provider assumed down, attempts are refused until `open_until`
//! - Half-Open: a single probe decides whether the provider recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: total >= min_requests and failure rate >= threshold
//! Open → Half-Open: first inquiry at or after open_until (no timers)
//! Half-Open → Closed: probe succeeds, open duration resets to base
//! Half-Open → Open: probe fails, open duration escalates
//! ```
//!
//! # Design Decisions
//! - One breaker embedded in every provider record (not global)
//! - Transitions are evaluated lazily from wall-clock time at inquiry
//! - Single probe in Half-Open, guarded by `half_open_probe_in_flight`
//! - The breaker owns no lock; the registry serializes access per provider

use serde::{Deserialize, Serialize};

use crate::config::HealthConfig;
use crate::resilience::backoff::escalate_open_ms;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Numeric encoding used for the state gauge.
    pub fn as_gauge(self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::HalfOpen => 1.0,
            CircuitState::Open => 2.0,
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// A state change worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Closed → Open.
    Opened { open_ms: u64 },
    /// Open → Half-Open.
    HalfOpened,
    /// Half-Open → Closed.
    Closed,
    /// Half-Open → Open.
    Reopened { open_ms: u64 },
}

/// Per-provider breaker state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitBreaker {
    /// Current state.
    pub circuit_state: CircuitState,
    /// Epoch millis after which a half-open probe is permitted (Open), or
    /// after which an unfinished probe is abandoned (Half-Open).
    pub open_until: Option<u64>,
    /// Whether the single half-open probe has been dispatched.
    pub half_open_probe_in_flight: bool,
    /// Duration of the next open window in milliseconds.
    pub backoff_ms: u64,
}

impl CircuitBreaker {
    /// Create a closed breaker with the base open duration.
    pub fn new(config: &HealthConfig) -> Self {
        Self {
            circuit_state: CircuitState::Closed,
            open_until: None,
            half_open_probe_in_flight: false,
            backoff_ms: config.base_open_ms,
        }
    }

    /// Whether the failure counters justify tripping a closed breaker.
    ///
    /// Insufficient samples never trip the breaker.
    pub fn should_trip(total: u64, failures: u64, config: &HealthConfig) -> bool {
        if total == 0 || total < config.min_requests {
            return false;
        }
        failures as f64 / total as f64 >= config.fail_rate_threshold
    }

    /// Move Open → Half-Open when the open window has elapsed.
    pub fn advance(&mut self, now: u64, config: &HealthConfig) -> Option<Transition> {
        if self.circuit_state != CircuitState::Open {
            return None;
        }
        if now < self.open_until.unwrap_or(0) {
            return None;
        }
        self.circuit_state = CircuitState::HalfOpen;
        self.half_open_probe_in_flight = false;
        self.open_until = Some(now.saturating_add(config.half_open_probe_ms));
        Some(Transition::HalfOpened)
    }

    /// Whether an attempt may be made right now.
    ///
    /// Closed always admits. Open admits only once its window elapsed, at
    /// which point it becomes Half-Open. Half-Open admits while no probe is
    /// in flight; a probe that outlives its safety window is abandoned so
    /// the breaker cannot wedge.
    pub fn can_attempt(&mut self, now: u64, config: &HealthConfig) -> (bool, Option<Transition>) {
        match self.circuit_state {
            CircuitState::Closed => (true, None),
            CircuitState::Open => match self.advance(now, config) {
                Some(transition) => (true, Some(transition)),
                None => (false, None),
            },
            CircuitState::HalfOpen => {
                if !self.half_open_probe_in_flight {
                    return (true, None);
                }
                if now >= self.open_until.unwrap_or(0) {
                    self.half_open_probe_in_flight = false;
                    self.open_until = Some(now.saturating_add(config.half_open_probe_ms));
                    return (true, None);
                }
                (false, None)
            }
        }
    }

    /// Flag the half-open probe as dispatched. No-op in other states.
    pub fn mark_probe_start(&mut self) {
        if self.circuit_state == CircuitState::HalfOpen {
            self.half_open_probe_in_flight = true;
        }
    }

    /// Open the circuit for the current backoff, then escalate the backoff.
    fn open(&mut self, now: u64, config: &HealthConfig) -> u64 {
        let open_ms = self.backoff_ms;
        self.circuit_state = CircuitState::Open;
        self.half_open_probe_in_flight = false;
        self.open_until = Some(now.saturating_add(open_ms));
        self.backoff_ms = escalate_open_ms(open_ms, config.base_open_ms, config.max_open_ms);
        open_ms
    }

    /// Trip a closed breaker.
    pub fn trip(&mut self, now: u64, config: &HealthConfig) -> Option<Transition> {
        if self.circuit_state != CircuitState::Closed {
            return None;
        }
        let open_ms = self.open(now, config);
        Some(Transition::Opened { open_ms })
    }

    /// Apply a successful outcome.
    pub fn on_success(&mut self, config: &HealthConfig) -> Option<Transition> {
        if self.circuit_state != CircuitState::HalfOpen {
            return None;
        }
        self.circuit_state = CircuitState::Closed;
        self.half_open_probe_in_flight = false;
        self.open_until = None;
        self.backoff_ms = config.base_open_ms;
        Some(Transition::Closed)
    }

    /// Apply a failed outcome while half-open: the probe failed.
    pub fn on_probe_failure(&mut self, now: u64, config: &HealthConfig) -> Option<Transition> {
        if self.circuit_state != CircuitState::HalfOpen {
            return None;
        }
        let open_ms = self.open(now, config);
        Some(Transition::Reopened { open_ms })
    }
}
