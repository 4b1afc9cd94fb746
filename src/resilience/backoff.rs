//! Open-window escalation and inter-retry delays.

use std::time::Duration;

use rand::Rng;

/// Next open duration after an open window of `current_ms` was served.
///
/// Doubles, clamped to `[base_ms, max_ms]`.
pub fn escalate_open_ms(current_ms: u64, base_ms: u64, max_ms: u64) -> u64 {
    current_ms.saturating_mul(2).clamp(base_ms, max_ms.max(base_ms))
}

/// Delay before retry `attempt` within a tier (attempt 0 is the first try).
///
/// Grows linearly: `attempt * base_ms`, plus up to `jitter_ratio` of that
/// as random jitter.
pub fn retry_delay(attempt: u32, base_ms: u64, jitter_ratio: f64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let delay_ms = base_ms.saturating_mul(u64::from(attempt));

    let jitter_range = (delay_ms as f64 * jitter_ratio.clamp(0.0, 1.0)) as u64;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(delay_ms + jitter)
}
