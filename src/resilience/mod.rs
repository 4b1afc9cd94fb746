//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt against a provider:
//!     → timeouts.rs (enforce per-attempt deadline)
//!     → On failure: retries.rs (terminal for the tier, or retry after backoff.rs delay)
//!     → circuit_breaker.rs (trip, probe and escalate per provider)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every provider call has a deadline
//! - Breaker transitions happen on inquiry, never on a timer
//! - Open windows grow geometrically, retry delays linearly

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{CircuitBreaker, CircuitState, Transition};
