//! Retry policy for package manager calls.

use crate::config::PackageManagerProperties;
use std::time::Duration;

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_properties(&PackageManagerProperties::default())
    }
}

impl RetryPolicy {
    /// Derive the policy from `retry_count` and `retry_delay_sec`
    ///
    /// The delay doubles per attempt and is capped at six times the configured delay.
    pub fn from_properties(props: &PackageManagerProperties) -> Self {
        let initial = Duration::from_secs(props.retry_delay_sec);
        Self {
            max_retries: props.retry_count,
            initial_delay: initial,
            backoff_multiplier: 2.0,
            max_delay: initial * 6,
        }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-indexed)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}
