//! Exponential backoff policy
//!
//! Computes the delay applied before a same-credential retry. Delays only
//! ever apply between retries of one credential; switching credentials is
//! always immediate.

use rand::Rng;
use std::time::Duration;

/// Exponential backoff with an optional jitter component
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub base: Duration,

    /// Cap on any single delay
    pub max: Duration,

    /// Add a random jitter in [0, delay) on top of the computed delay
    pub use_jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(250),
            max: Duration::from_secs(10),
            use_jitter: false,
        }
    }
}

impl BackoffPolicy {
    pub fn new(base: Duration, max: Duration, use_jitter: bool) -> Self {
        Self {
            base,
            max,
            use_jitter,
        }
    }

    /// Delay applied after the given attempt (1-indexed) before retrying
    /// the same credential: `base * 2^(attempt-1)`, capped at `max`.
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let delay_ms = (self.base.as_millis() as u64).saturating_mul(1u64 << exponent);
        let delay_ms = delay_ms.min(self.max.as_millis() as u64);

        let delay_ms = if self.use_jitter && delay_ms > 0 {
            let jitter = rand::thread_rng().gen_range(0..delay_ms);
            (delay_ms + jitter).min(self.max.as_millis() as u64)
        } else {
            delay_ms
        };

        Duration::from_millis(delay_ms)
    }
}
