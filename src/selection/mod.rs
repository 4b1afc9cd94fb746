//! Provider selection subsystem.
//!
//! # Data Flow
//! ```text
//! Caller asks for an attempt order over candidate providers
//!     → health registry (eligibility via can_attempt, current score)
//!     → score.rs (composite fitness, recomputed on every outcome)
//!     → selector.rs (eligible by score, then ineligible)
//!     → ordered provider ids
//! ```
//!
//! # Design Decisions
//! - Selection is stateless; the registry owns all provider state
//! - Ordering is deterministic under equal scores
//! - Troubled providers are demoted, never hidden

pub mod score;
pub mod selector;

pub use selector::{rank, Candidate};
