//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (weights, rates, durations)
//! - Detect duplicate provider identifiers
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RouterConfig;

/// Tolerance for the score weights summing to one.
const WEIGHT_SUM_TOLERANCE: f64 = 0.05;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("score weights must sum to 1.0 (±0.05), got {0}")]
    WeightSum(f64),

    #[error("health.max_open_ms ({max}) is below health.base_open_ms ({base})")]
    OpenWindow { base: u64, max: u64 },

    #[error("{field} is not a valid socket address: {value}")]
    Address { field: &'static str, value: String },

    #[error("provider id must not be empty")]
    EmptyProviderId,

    #[error("duplicate provider id: {0}")]
    DuplicateProvider(String),
}

fn check_range(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) {
    if !(min..=max).contains(&value) {
        errors.push(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
}

fn check_positive(errors: &mut Vec<ValidationError>, field: &'static str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::Zero(field));
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field,
            value: value.to_string(),
        });
    }
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let health = &config.health;

    check_range(&mut errors, "health.weight_availability", health.weight_availability, 0.0, 1.0);
    check_range(&mut errors, "health.weight_json", health.weight_json, 0.0, 1.0);
    check_range(&mut errors, "health.weight_latency", health.weight_latency, 0.0, 1.0);

    let sum = health.weight_availability + health.weight_json + health.weight_latency;
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        errors.push(ValidationError::WeightSum(sum));
    }

    // Both lower bounds are exclusive.
    if health.ema_alpha <= 0.0 {
        errors.push(ValidationError::Zero("health.ema_alpha"));
    }
    check_range(&mut errors, "health.ema_alpha", health.ema_alpha, 0.0, 1.0);
    if health.fail_rate_threshold <= 0.0 {
        errors.push(ValidationError::Zero("health.fail_rate_threshold"));
    }
    check_range(
        &mut errors,
        "health.fail_rate_threshold",
        health.fail_rate_threshold,
        0.0,
        1.0,
    );

    check_positive(&mut errors, "health.min_requests", health.min_requests);
    check_positive(&mut errors, "health.target_latency_ms", health.target_latency_ms);
    check_positive(&mut errors, "health.base_open_ms", health.base_open_ms);
    check_positive(&mut errors, "health.half_open_probe_ms", health.half_open_probe_ms);
    if health.max_open_ms < health.base_open_ms {
        errors.push(ValidationError::OpenWindow {
            base: health.base_open_ms,
            max: health.max_open_ms,
        });
    }

    check_positive(&mut errors, "retry.attempt_timeout_ms", config.retry.attempt_timeout_ms);
    check_range(&mut errors, "retry.jitter_ratio", config.retry.jitter_ratio, 0.0, 1.0);
    check_positive(
        &mut errors,
        "evidence.max_per_domain",
        config.evidence.max_per_domain as u64,
    );

    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let mut seen = HashSet::new();
    for provider in &config.providers {
        if provider.id.trim().is_empty() {
            errors.push(ValidationError::EmptyProviderId);
        } else if !seen.insert(provider.id.as_str()) {
            errors.push(ValidationError::DuplicateProvider(provider.id.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
