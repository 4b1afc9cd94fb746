//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Signal received → latch set → diagnostic endpoint drains → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - The registry has no teardown; it dies with the process

pub mod shutdown;
pub mod signals;

pub use shutdown::{drain, Shutdown, ShutdownSignal};
