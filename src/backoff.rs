// file: src/backoff.rs
// description: reconnect budget and delay schedule

use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(5_000);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(10_000);

/// Linear backoff capped at `max_delay`, bounded by `max_retries` attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    Exhausted,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// `min(base * (retry_count + 1), max)`
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        self.base_delay
            .saturating_mul(retry_count.saturating_add(1))
            .min(self.max_delay)
    }

    pub fn decide(&self, retry_count: u32) -> RetryDecision {
        if retry_count < self.max_retries {
            RetryDecision::Retry {
                delay: self.delay_for(retry_count),
            }
        } else {
            RetryDecision::Exhausted
        }
    }
}
