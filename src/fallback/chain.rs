//! Fallback chain executor.
//!
//! # Responsibilities
//! - Walk tiers strictly in order, falling through on exhaustion
//! - Retry sequentially within a tier with a linearly growing delay
//! - Report every attempt outcome to the health registry
//! - Normalize and deduplicate the winning tier's result
//!
//! # Design Decisions
//! - A tier whose breaker refuses it is skipped without an attempt
//! - The last tier never falls back further; its refusal or failure
//!   reaches the caller with the provider's last recorded reason
//! - Terminal rejections end a tier immediately
//! - No registry lock is held while awaiting a provider

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::config::{EvidenceConfig, RetryConfig};
use crate::fallback::dedup::dedup_evidence;
use crate::fallback::error::{AttemptError, ChainError};
use crate::fallback::normalize::{normalize, NormalizedResult};
use crate::fallback::tier::{AttemptOptions, EvidenceCitation, Tier};
use crate::health::{FailureReason, HealthRegistry, ProviderId};
use crate::observability::metrics;
use crate::resilience::backoff::retry_delay;
use crate::resilience::retries::attempts_for;
use crate::resilience::timeouts::with_timeout;

/// Caller options for one chain execution.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Correlates log events; generated when absent.
    pub execution_id: Option<Uuid>,
    /// Overrides `evidence.max_per_domain`.
    pub max_per_domain: Option<usize>,
}

/// Normalized result of a successful chain execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainResult {
    pub text: String,
    pub citations: Vec<EvidenceCitation>,
    /// Name of the tier that produced the result.
    pub used_tier: String,
    pub provider: ProviderId,
    /// Attempts made in the winning tier.
    pub attempts: u32,
    pub execution_id: Uuid,
}

/// Why a tier produced no result.
#[derive(Debug)]
enum TierFailure {
    /// The breaker refused the tier before any attempt.
    Skipped,
    /// Attempts ran and the last one failed.
    Exhausted(AttemptError),
}

/// Runs one logical request across an ordered list of tiers.
#[derive(Debug, Clone)]
pub struct FallbackExecutor {
    registry: Arc<HealthRegistry>,
    retry: RetryConfig,
    evidence: EvidenceConfig,
}

impl FallbackExecutor {
    pub fn new(registry: Arc<HealthRegistry>, retry: RetryConfig, evidence: EvidenceConfig) -> Self {
        Self {
            registry,
            retry,
            evidence,
        }
    }

    pub fn registry(&self) -> &Arc<HealthRegistry> {
        &self.registry
    }

    /// Execute `query` across `tiers`, returning the first tier's success.
    pub async fn execute(
        &self,
        query: &str,
        tiers: &[Tier],
        options: &ExecutionOptions,
    ) -> Result<ChainResult, ChainError> {
        let (last, fallbacks) = tiers.split_last().ok_or(ChainError::EmptyChain)?;
        let execution_id = options.execution_id.unwrap_or_else(Uuid::new_v4);

        for tier in fallbacks {
            match self.run_tier(query, tier, execution_id).await {
                Ok((result, attempts)) => {
                    return Ok(self.finish(result, tier, attempts, execution_id, options));
                }
                Err(TierFailure::Skipped) => {
                    tracing::info!(
                        execution_id = %execution_id,
                        tier = %tier.name,
                        provider = %tier.provider,
                        "Circuit refused tier, falling through"
                    );
                    metrics::record_tier_fallthrough(&tier.name);
                }
                Err(TierFailure::Exhausted(err)) => {
                    tracing::warn!(
                        execution_id = %execution_id,
                        tier = %tier.name,
                        provider = %tier.provider,
                        reason = %err.reason,
                        error = %err.message,
                        "Tier exhausted, falling through"
                    );
                    metrics::record_tier_fallthrough(&tier.name);
                }
            }
        }

        match self.run_tier(query, last, execution_id).await {
            Ok((result, attempts)) => Ok(self.finish(result, last, attempts, execution_id, options)),
            Err(failure) => {
                let err = match failure {
                    TierFailure::Exhausted(err) => err,
                    TierFailure::Skipped => self.refusal(last),
                };
                tracing::error!(
                    execution_id = %execution_id,
                    tier = %last.name,
                    provider = %last.provider,
                    reason = %err.reason,
                    error = %err.message,
                    "All tiers exhausted"
                );
                metrics::record_chain("failure");
                Err(ChainError::Exhausted {
                    tier: last.name.clone(),
                    provider: last.provider.clone(),
                    reason: err.reason,
                    message: err.message,
                })
            }
        }
    }

    async fn run_tier(
        &self,
        query: &str,
        tier: &Tier,
        execution_id: Uuid,
    ) -> Result<(NormalizedResult, u32), TierFailure> {
        let attempts = attempts_for(tier.max_retries.unwrap_or(self.retry.max_retries));
        let timeout = tier
            .attempt_timeout
            .unwrap_or(Duration::from_millis(self.retry.attempt_timeout_ms));
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = retry_delay(attempt, self.retry.base_delay_ms, self.retry.jitter_ratio);
                tracing::info!(
                    execution_id = %execution_id,
                    tier = %tier.name,
                    attempt,
                    delay = ?delay,
                    "Retrying tier"
                );
                tokio::time::sleep(delay).await;
            }

            if !self.registry.try_acquire(&tier.provider) {
                return Err(match last_error {
                    Some(err) => TierFailure::Exhausted(err),
                    None => TierFailure::Skipped,
                });
            }

            let options = AttemptOptions {
                execution_id,
                tier: tier.name.clone(),
                attempt,
                timeout,
            };
            let started = Instant::now();
            let outcome = with_timeout(timeout, tier.transport.attempt(query, &options))
                .await
                .and_then(normalize);
            let latency_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(result) => {
                    self.registry
                        .record_success(&tier.provider, latency_ms, result.structured);
                    return Ok((result, attempt + 1));
                }
                Err(err) => {
                    tracing::warn!(
                        execution_id = %execution_id,
                        tier = %tier.name,
                        provider = %tier.provider,
                        attempt,
                        reason = %err.reason,
                        status = ?err.status,
                        latency_ms,
                        error = %err.message,
                        "Attempt failed"
                    );
                    if err.terminal {
                        self.registry.record_terminal_failure(
                            &tier.provider,
                            Some(latency_ms),
                            err.reason,
                            err.message.clone(),
                        );
                        return Err(TierFailure::Exhausted(err));
                    }
                    self.registry.record_failure(
                        &tier.provider,
                        Some(latency_ms),
                        err.reason,
                        err.message.clone(),
                    );
                    last_error = Some(err);
                }
            }
        }

        Err(TierFailure::Exhausted(
            last_error.unwrap_or_else(|| AttemptError::unknown("tier made no attempts")),
        ))
    }

    /// Error for a tier whose breaker refused it, built from the
    /// provider's last recorded failure.
    fn refusal(&self, tier: &Tier) -> AttemptError {
        let stats = self.registry.get(&tier.provider);
        let message = match stats.last_error {
            Some(ref error) => format!("circuit {}; last error: {error}", stats.state()),
            None => format!("circuit {}; attempt refused", stats.state()),
        };
        AttemptError::new(
            stats.last_failure_reason.unwrap_or(FailureReason::Unknown),
            message,
        )
    }

    fn finish(
        &self,
        result: NormalizedResult,
        tier: &Tier,
        attempts: u32,
        execution_id: Uuid,
        options: &ExecutionOptions,
    ) -> ChainResult {
        let cap = options.max_per_domain.unwrap_or(self.evidence.max_per_domain);
        let citations = dedup_evidence(result.citations, cap);

        tracing::info!(
            execution_id = %execution_id,
            tier = %tier.name,
            provider = %tier.provider,
            attempts,
            citations = citations.len(),
            "Chain completed"
        );
        metrics::record_chain("success");

        ChainResult {
            text: result.text,
            citations,
            used_tier: tier.name.clone(),
            provider: tier.provider.clone(),
            attempts,
            execution_id,
        }
    }
}
