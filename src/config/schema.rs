//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the provider router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Health scoring and circuit breaker settings.
    pub health: HealthConfig,

    /// Retry behaviour inside a fallback tier.
    pub retry: RetryConfig,

    /// Evidence deduplication settings.
    pub evidence: EvidenceConfig,

    /// Diagnostic endpoint settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Providers registered at startup.
    pub providers: Vec<ProviderConfig>,
}

/// Provider health, scoring and circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Latency at which latency fitness drops to 0.5.
    pub target_latency_ms: u64,

    /// Weight of the success rate in the composite score.
    pub weight_availability: f64,

    /// Weight of the structured-output rate in the composite score.
    pub weight_json: f64,

    /// Weight of latency fitness in the composite score.
    pub weight_latency: f64,

    /// EMA smoothing factor for latency (weight of the newest sample).
    pub ema_alpha: f64,

    /// Minimum number of attempts before the breaker may trip.
    pub min_requests: u64,

    /// Failure rate at or above which a closed breaker opens.
    pub fail_rate_threshold: f64,

    /// First open duration in milliseconds.
    pub base_open_ms: u64,

    /// Ceiling for the open duration in milliseconds.
    pub max_open_ms: u64,

    /// Window granted to a half-open probe before another may be admitted.
    pub half_open_probe_ms: u64,

    /// Whether terminal failures (not entitled, not found) count toward
    /// the trip rate.
    pub trip_on_terminal: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            target_latency_ms: 4_000,
            weight_availability: 0.55,
            weight_json: 0.30,
            weight_latency: 0.15,
            ema_alpha: 0.2,
            min_requests: 12,
            fail_rate_threshold: 0.35,
            base_open_ms: 8_000,
            max_open_ms: 120_000,
            half_open_probe_ms: 15_000,
            trip_on_terminal: true,
        }
    }
}

/// Retry configuration within a single tier.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt (a tier makes `max_retries + 1` attempts).
    pub max_retries: u32,

    /// Delay unit between attempts; attempt `n` waits `n * base_delay_ms`.
    pub base_delay_ms: u64,

    /// Upper bound for a single transport attempt in milliseconds.
    pub attempt_timeout_ms: u64,

    /// Fraction of the delay added as random jitter (0.0 disables jitter).
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay_ms: 500,
            attempt_timeout_ms: 30_000,
            jitter_ratio: 0.0,
        }
    }
}

/// Evidence deduplication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EvidenceConfig {
    /// Maximum citations kept per originating domain.
    pub max_per_domain: usize,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self { max_per_domain: 2 }
    }
}

/// Diagnostic endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the diagnostic endpoint.
    pub enabled: bool,

    /// Bind address for the diagnostic endpoint.
    pub bind_address: String,

    /// Bearer token required by the endpoint. No auth when unset.
    pub api_key: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8081".to_string(),
            api_key: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A provider known at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Stable provider identifier.
    pub id: String,

    /// Capability tier the provider serves (informational).
    #[serde(default)]
    pub tier: Option<String>,
}
