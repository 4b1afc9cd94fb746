//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap every transport attempt with a deadline
//! - Turn an elapsed deadline into a `timeout` failure
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - The timed-out future is dropped; there is no cancellation signal
//!   beyond that

use std::future::Future;
use std::time::Duration;

use crate::fallback::AttemptError;

/// Run `fut` with a deadline, mapping expiry to a timeout failure.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, AttemptError>
where
    F: Future<Output = Result<T, AttemptError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AttemptError::timeout(format!(
            "no response within {} ms",
            limit.as_millis()
        ))),
    }
}
