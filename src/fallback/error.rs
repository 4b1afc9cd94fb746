//! Attempt and chain errors.

use thiserror::Error;

use crate::health::{FailureReason, ProviderId};
use crate::resilience::retries::{is_terminal_status, reason_for_status};

/// Outcome of a failed transport attempt, tagged with its failure reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}: {message}")]
pub struct AttemptError {
    pub reason: FailureReason,
    pub message: String,
    /// HTTP status, when the provider answered with one.
    pub status: Option<u16>,
    /// Ends the tier without exhausting its retries.
    pub terminal: bool,
}

impl AttemptError {
    pub fn new(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
            status: None,
            terminal: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureReason::Timeout, message)
    }

    pub fn json(message: impl Into<String>) -> Self {
        Self::new(FailureReason::Json, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureReason::Validation, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(FailureReason::Unknown, message)
    }

    /// A non-2xx answer. Entitlement and not-found statuses are terminal.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            reason: reason_for_status(Some(status)),
            message: message.into(),
            status: Some(status),
            terminal: is_terminal_status(status),
        }
    }

    /// A transport-level rejection with no status (connection refused, reset).
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailureReason::Http, message)
    }
}

/// Failure surfaced to the caller of a fallback chain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    #[error("fallback chain has no tiers")]
    EmptyChain,

    #[error("all tiers exhausted; last tier {tier} ({provider}) failed with {reason}: {message}")]
    Exhausted {
        tier: String,
        provider: ProviderId,
        reason: FailureReason,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_terminal_classification() {
        let forbidden = AttemptError::http(403, "not entitled");
        assert_eq!(forbidden.reason, FailureReason::Http);
        assert!(forbidden.terminal);

        let unavailable = AttemptError::http(503, "overloaded");
        assert_eq!(unavailable.reason, FailureReason::Http);
        assert!(!unavailable.terminal);
        assert_eq!(unavailable.status, Some(503));
    }

    #[test]
    fn test_display() {
        assert_eq!(AttemptError::json("eof").to_string(), "json: eof");
        let err = ChainError::Exhausted {
            tier: "basic".into(),
            provider: "search".into(),
            reason: FailureReason::Timeout,
            message: "slow".into(),
        };
        assert_eq!(
            err.to_string(),
            "all tiers exhausted; last tier basic (search) failed with timeout: slow"
        );
    }
}
