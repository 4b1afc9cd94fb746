//! Process-wide provider health registry.
//!
//! # Responsibilities
//! - Own every `ProviderStats` record, creating them lazily on first reference
//! - Serialize mutation per provider and report breaker transitions
//! - Answer "may I attempt?" and "in which order?" for callers
//!
//! # Design Decisions
//! - Sharded map of per-provider mutexes: unrelated providers never contend
//! - Locks are held only for counter/state updates, never across I/O
//! - Constructed once at startup and shared by `Arc`; no global, no teardown

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use serde::Serialize;

use crate::config::HealthConfig;
use crate::health::clock::{Clock, SystemClock};
use crate::health::stats::{FailureReason, ProviderId, ProviderStats};
use crate::observability::metrics;
use crate::resilience::{CircuitState, Transition};
use crate::selection::{rank, Candidate};

type Record = Arc<Mutex<ProviderStats>>;

/// Read-only diagnostic view of the registry.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    /// Epoch millis at which the snapshot was taken.
    pub now: u64,
    pub config: HealthConfig,
    pub providers: BTreeMap<ProviderId, ProviderStats>,
    /// Preference order over all known providers.
    pub order: Vec<ProviderId>,
}

/// Thread-safe map from provider id to its health record.
#[derive(Debug)]
pub struct HealthRegistry {
    providers: DashMap<ProviderId, Record>,
    config: HealthConfig,
    clock: Arc<dyn Clock>,
}

fn lock(record: &Mutex<ProviderStats>) -> MutexGuard<'_, ProviderStats> {
    // Counters stay valid even if a holder panicked mid-update.
    record.lock().unwrap_or_else(PoisonError::into_inner)
}

impl HealthRegistry {
    /// Create a registry reading the system clock.
    pub fn new(config: HealthConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a registry with an explicit clock.
    pub fn with_clock(config: HealthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            providers: DashMap::new(),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    fn record(&self, id: &ProviderId) -> Record {
        if let Some(record) = self.providers.get(id) {
            return record.value().clone();
        }
        self.providers
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(ProviderStats::new(id.clone(), &self.config))))
            .value()
            .clone()
    }

    /// Pre-create a record so it shows up before first traffic.
    pub fn register(&self, id: impl Into<ProviderId>) {
        let id = id.into();
        let stats = lock(&self.record(&id)).clone();
        metrics::record_provider_health(id.as_str(), stats.state(), stats.score);
    }

    /// All known provider ids in lexical order.
    pub fn known_providers(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.providers.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// The record for `id`, created if absent.
    pub fn get(&self, id: &ProviderId) -> ProviderStats {
        lock(&self.record(id)).clone()
    }

    /// The record for `id` if it exists. Never creates one.
    pub fn peek(&self, id: &ProviderId) -> Option<ProviderStats> {
        let record = self.providers.get(id)?.value().clone();
        let stats = lock(&record).clone();
        Some(stats)
    }

    /// Record a successful attempt.
    pub fn record_success(&self, id: &ProviderId, latency_ms: u64, output_valid: bool) {
        let record = self.record(id);
        let (transition, state, score) = {
            let mut stats = lock(&record);
            let transition = stats.apply_success(latency_ms, output_valid, &self.config);
            (transition, stats.state(), stats.score)
        };

        tracing::debug!(
            provider = %id,
            latency_ms,
            output_valid,
            score,
            "Provider attempt succeeded"
        );
        metrics::record_attempt(id.as_str(), "success", Some(latency_ms));
        metrics::record_provider_health(id.as_str(), state, score);
        self.report(id, transition);
    }

    /// Record a failed attempt.
    pub fn record_failure(
        &self,
        id: &ProviderId,
        latency_ms: Option<u64>,
        reason: FailureReason,
        message: impl Into<String>,
    ) {
        self.apply_failure(id, latency_ms, reason, message.into(), false);
    }

    /// Record a failure that was terminal for its tier (not entitled,
    /// not found). Counts toward the trip rate only with `trip_on_terminal`.
    pub fn record_terminal_failure(
        &self,
        id: &ProviderId,
        latency_ms: Option<u64>,
        reason: FailureReason,
        message: impl Into<String>,
    ) {
        self.apply_failure(id, latency_ms, reason, message.into(), true);
    }

    fn apply_failure(
        &self,
        id: &ProviderId,
        latency_ms: Option<u64>,
        reason: FailureReason,
        message: String,
        terminal: bool,
    ) {
        let now = self.clock.now_ms();
        let record = self.record(id);
        let (transition, state, score) = {
            let mut stats = lock(&record);
            let transition = stats.apply_failure(
                now,
                latency_ms,
                reason,
                message.clone(),
                terminal,
                &self.config,
            );
            (transition, stats.state(), stats.score)
        };

        tracing::debug!(
            provider = %id,
            reason = %reason,
            terminal,
            latency_ms = ?latency_ms,
            error = %message,
            score,
            "Provider attempt failed"
        );
        metrics::record_attempt(id.as_str(), reason.as_str(), latency_ms);
        metrics::record_provider_health(id.as_str(), state, score);
        self.report(id, transition);
    }

    /// Whether an attempt may be made against `id` now.
    ///
    /// An open circuit whose window elapsed moves to half-open here.
    pub fn can_attempt(&self, id: &ProviderId) -> bool {
        let now = self.clock.now_ms();
        let record = self.record(id);
        let (admitted, transition, state, score) = {
            let mut stats = lock(&record);
            let (admitted, transition) = stats.admit(now, false, &self.config);
            (admitted, transition, stats.state(), stats.score)
        };
        self.observe_transition(id, transition, state, score);
        admitted
    }

    /// Flag the half-open probe as dispatched. No-op unless half-open.
    pub fn mark_probe_start(&self, id: &ProviderId) {
        lock(&self.record(id)).breaker.mark_probe_start();
    }

    /// `can_attempt` followed by `mark_probe_start` under one lock, so two
    /// callers can never both take the half-open probe.
    pub fn try_acquire(&self, id: &ProviderId) -> bool {
        let now = self.clock.now_ms();
        let record = self.record(id);
        let (admitted, transition, state, score) = {
            let mut stats = lock(&record);
            let (admitted, transition) = stats.admit(now, true, &self.config);
            (admitted, transition, stats.state(), stats.score)
        };
        self.observe_transition(id, transition, state, score);
        admitted
    }

    /// Candidates in preference order: eligible by score, then ineligible.
    pub fn best_order(&self, candidates: &[ProviderId]) -> Vec<ProviderId> {
        let ranked = candidates
            .iter()
            .map(|id| {
                let eligible = self.can_attempt(id);
                let score = lock(&self.record(id)).score;
                Candidate {
                    id: id.clone(),
                    score,
                    eligible,
                }
            })
            .collect();
        rank(ranked)
    }

    /// Side-effect-free view of every provider, the config and the order.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let now = self.clock.now_ms();
        let providers: BTreeMap<ProviderId, ProviderStats> = self
            .known_providers()
            .into_iter()
            .filter_map(|id| self.peek(&id).map(|stats| (id, stats)))
            .collect();

        let order = rank(
            providers
                .values()
                .map(|stats| Candidate {
                    id: stats.id.clone(),
                    score: stats.score,
                    eligible: stats.eligible_at(now, &self.config),
                })
                .collect(),
        );

        RegistrySnapshot {
            now,
            config: self.config.clone(),
            providers,
            order,
        }
    }

    fn observe_transition(
        &self,
        id: &ProviderId,
        transition: Option<Transition>,
        state: CircuitState,
        score: f64,
    ) {
        if transition.is_some() {
            metrics::record_provider_health(id.as_str(), state, score);
        }
        self.report(id, transition);
    }

    fn report(&self, id: &ProviderId, transition: Option<Transition>) {
        match transition {
            Some(Transition::Opened { open_ms }) => {
                tracing::warn!(provider = %id, open_ms, "Circuit opened");
            }
            Some(Transition::HalfOpened) => {
                tracing::info!(provider = %id, "Circuit half-open, admitting probe");
            }
            Some(Transition::Closed) => {
                tracing::info!(provider = %id, "Circuit closed, provider recovered");
            }
            Some(Transition::Reopened { open_ms }) => {
                tracing::warn!(provider = %id, open_ms, "Probe failed, circuit reopened");
            }
            None => {}
        }
    }
}
