//! Provider routing and resilience library.
//!
//! Decides, request by request, which interchangeable content-analysis
//! providers to try, in what order, and when to stop trying a failing one.

pub mod admin;
pub mod config;
pub mod fallback;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod selection;

pub use config::RouterConfig;
pub use fallback::{ChainError, ChainResult, ExecutionOptions, FallbackExecutor, Tier};
pub use health::{HealthRegistry, ProviderId};
pub use lifecycle::Shutdown;
