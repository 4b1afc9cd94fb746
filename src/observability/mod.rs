//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registry and fallback executor produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Every breaker transition is logged with the provider id
//! - Each chain execution carries an execution id through its events
//! - Metrics are cheap and optional

pub mod logging;
pub mod metrics;
