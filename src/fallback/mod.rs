//! Tiered fallback subsystem.
//!
//! # Data Flow
//! ```text
//! execute(query, tiers)
//!     → chain.rs: for each tier in order
//!         → registry.try_acquire(provider)      (skip tier if refused)
//!         → tier.rs transport attempt           (bounded by timeout)
//!         → normalize.rs                        (canonical text + citations)
//!         → registry.record_success / record_failure
//!         → retry with linear delay, or fall through
//!     → dedup.rs (drop repeated sources, cap per domain)
//!     → ChainResult { text, citations, used_tier }
//! ```
//!
//! # Design Decisions
//! - A tier is a capability level, not a retry of the previous one
//! - Provider response shapes never leak past the executor
//! - Only the last tier's failure reaches the caller

pub mod chain;
pub mod dedup;
pub mod error;
pub mod normalize;
pub mod tier;

pub use chain::{ChainResult, ExecutionOptions, FallbackExecutor};
pub use error::{AttemptError, ChainError};
pub use normalize::NormalizedResult;
pub use tier::{AttemptOptions, EvidenceCitation, SearchHit, Tier, TierResponse, TierTransport};
