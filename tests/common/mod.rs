//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use provider_router::config::{EvidenceConfig, HealthConfig, RetryConfig};
use provider_router::fallback::{
    AttemptError, AttemptOptions, FallbackExecutor, TierResponse, TierTransport,
};
use provider_router::health::{FailureReason, HealthRegistry, ManualClock, ProviderId};

/// Transport that replays a fixed script of outcomes, one per attempt.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<TierResponse, AttemptError>>>,
    calls: AtomicU32,
    delay: Duration,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<TierResponse, AttemptError>>) -> Arc<Self> {
        Self::with_delay(script, Duration::ZERO)
    }

    /// Like `new`, but every attempt takes `delay` before answering.
    pub fn with_delay(
        script: Vec<Result<TierResponse, AttemptError>>,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicU32::new(0),
            delay,
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TierTransport for ScriptedTransport {
    async fn attempt(
        &self,
        _query: &str,
        _options: &AttemptOptions,
    ) -> Result<TierResponse, AttemptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AttemptError::unknown("script exhausted")))
    }
}

/// Registry on a manual clock starting at `start_ms`.
pub fn registry_at(start_ms: u64) -> (Arc<HealthRegistry>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start_ms));
    let registry = Arc::new(HealthRegistry::with_clock(HealthConfig::default(), clock.clone()));
    (registry, clock)
}

/// Executor with no retry delay and the given retry allowance.
pub fn executor(registry: Arc<HealthRegistry>, max_retries: u32) -> FallbackExecutor {
    let retry = RetryConfig {
        max_retries,
        base_delay_ms: 0,
        attempt_timeout_ms: 5_000,
        jitter_ratio: 0.0,
    };
    FallbackExecutor::new(registry, retry, EvidenceConfig::default())
}

/// Trip `id` open with `min_requests` timeouts at the clock's current time.
pub fn trip(registry: &HealthRegistry, id: &ProviderId) {
    for _ in 0..registry.config().min_requests {
        registry.record_failure(id, None, FailureReason::Timeout, "deadline exceeded");
    }
}
