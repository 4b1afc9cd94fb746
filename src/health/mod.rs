//! Provider health subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt outcome observed by the fallback executor
//!     → registry.rs (record_success / record_failure)
//!     → stats.rs (counters, EMA latency, derived rates)
//!     → circuit breaker (trip, probe, escalate)
//!     → score recomputed
//!
//! Inquiry from a caller:
//!     → registry.rs (can_attempt / best_order / snapshot)
//!     → clock.rs (wall-clock time at the moment of inquiry)
//! ```
//!
//! # Design Decisions
//! - One record per provider, created lazily, never deleted
//! - Health history lives only as long as the process
//! - No background tasks; time only matters when someone asks

pub mod clock;
pub mod registry;
pub mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use registry::{HealthRegistry, RegistrySnapshot};
pub use stats::{FailureReason, ProviderId, ProviderStats};
