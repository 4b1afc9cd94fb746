//! Retry classification.
//!
//! # Responsibilities
//! - Decide whether a failed attempt is worth retrying within its tier
//! - Map transport status codes onto failure reasons
//!
//! # Design Decisions
//! - Entitlement and not-found rejections are terminal for the tier: the
//!   same provider will answer the same way on every retry
//! - Timeouts, 5xx, 429 and malformed output are retryable
//! - Retries are strictly sequential; there is no retry budget

use crate::health::FailureReason;

/// Statuses that end a tier immediately.
const TERMINAL_STATUSES: &[u16] = &[401, 402, 403, 404, 410];

/// Whether an HTTP status is a definitive client-side rejection.
pub fn is_terminal_status(status: u16) -> bool {
    TERMINAL_STATUSES.contains(&status)
}

/// Failure reason for a rejected attempt, given the status if one came back.
pub fn reason_for_status(status: Option<u16>) -> FailureReason {
    match status {
        Some(_) => FailureReason::Http,
        None => FailureReason::Unknown,
    }
}

/// Number of attempts a tier makes for a retry allowance.
pub fn attempts_for(max_retries: u32) -> u32 {
    max_retries.saturating_add(1)
}
