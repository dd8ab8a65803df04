//! Retry policy for analysis requests
//!
//! Exponential backoff without jitter: 1s, 2s, 4s, 8s, 8s, ...

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;

/// Upper bound for `max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.min(MAX_RETRIES_LIMIT) + 1
    }

    /// Delay before each retry, in order.
    pub fn delays(&self) -> Vec<Duration> {
        let mut schedule = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_delay)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_interval(self.max_delay.max(self.initial_delay))
            .with_max_elapsed_time(None)
            .build();

        (1..self.max_attempts())
            .map(|_| {
                // No max elapsed time, so the schedule never runs out.
                let delay = schedule.next_backoff().unwrap_or(self.max_delay);
                Duration::from_millis(delay.as_millis() as u64)
            })
            .collect()
    }
}
