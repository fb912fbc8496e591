//! # Fibonacci Backoff
//!
//! Progressive backoff that grows more slowly than exponential backoff.
//!
//! The sequence is calculated in minutes: with a 1 minute minimum and a
//! 10 minute maximum it runs 1m, 1m, 2m, 3m, 5m, 8m, 10m, 10m, ...
//!
//! ```rust
//! use operator_core::policy::backoff::FibonacciBackoff;
//!
//! let mut backoff = FibonacciBackoff::new(1, 10);
//! assert_eq!(backoff.next_backoff_seconds(), 60);
//! assert_eq!(backoff.next_backoff_seconds(), 60);
//! assert_eq!(backoff.next_backoff_seconds(), 120);
//! ```

use crate::constants::{
    DEFAULT_FIBONACCI_MAX_ATTEMPTS, DEFAULT_FIBONACCI_MAX_MINUTES, DEFAULT_FIBONACCI_MIN_MINUTES,
};
use crate::policy::retry::{Retry, RetryExecution};
use crate::registry::{ConfigBlock, Configurable};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Each backoff is the sum of the previous two, capped at `max_minutes`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    /// Minimum backoff value in minutes (for reset)
    min_minutes: u64,
    /// Previous backoff value in minutes
    prev_minutes: u64,
    /// Current backoff value in minutes
    current_minutes: u64,
    /// Maximum backoff value in minutes
    max_minutes: u64,
}

impl FibonacciBackoff {
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            min_minutes,
            prev_minutes: 0,
            current_minutes: min_minutes,
            max_minutes,
        }
    }

    /// Return the current backoff in seconds and advance the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let result_seconds = self.current_minutes.saturating_mul(60);

        let next_minutes = self.prev_minutes.saturating_add(self.current_minutes);
        self.prev_minutes = self.current_minutes;
        self.current_minutes = std::cmp::min(next_minutes, self.max_minutes);

        result_seconds
    }

    #[must_use]
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }

    pub fn reset(&mut self) {
        self.prev_minutes = 0;
        self.current_minutes = self.min_minutes;
    }
}

/// Retry policy whose delays follow a [`FibonacciBackoff`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FibonacciRetry {
    min_minutes: u64,
    max_minutes: u64,
    max_attempts: u32,
}

impl Default for FibonacciRetry {
    fn default() -> Self {
        Self {
            min_minutes: DEFAULT_FIBONACCI_MIN_MINUTES,
            max_minutes: DEFAULT_FIBONACCI_MAX_MINUTES,
            max_attempts: DEFAULT_FIBONACCI_MAX_ATTEMPTS,
        }
    }
}

impl FibonacciRetry {
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64, max_attempts: u32) -> Self {
        Self {
            min_minutes,
            max_minutes,
            max_attempts,
        }
    }
}

impl Retry for FibonacciRetry {
    fn init_execution(&self) -> Box<dyn RetryExecution> {
        Box::new(FibonacciRetryExecution {
            backoff: FibonacciBackoff::new(self.min_minutes, self.max_minutes),
            attempts: 0,
            max_attempts: self.max_attempts,
        })
    }
}

#[derive(Debug)]
struct FibonacciRetryExecution {
    backoff: FibonacciBackoff,
    attempts: u32,
    max_attempts: u32,
}

impl RetryExecution for FibonacciRetryExecution {
    fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.backoff.next_backoff())
    }

    fn is_last_attempt(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    fn attempt_count(&self) -> u32 {
        self.attempts
    }
}

/// `fibonacciBackoff` configuration block for [`FibonacciRetry`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FibonacciBackoffConfig {
    #[serde(default)]
    pub min_minutes: Option<u64>,
    #[serde(default)]
    pub max_minutes: Option<u64>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl ConfigBlock for FibonacciBackoffConfig {
    const KEY: &'static str = "fibonacciBackoff";
}

impl Configurable<FibonacciBackoffConfig> for FibonacciRetry {
    fn init_from(&mut self, config: FibonacciBackoffConfig) {
        if let Some(min) = config.min_minutes {
            self.min_minutes = min;
        }
        if let Some(max) = config.max_minutes {
            self.max_minutes = max;
        }
        if let Some(attempts) = config.max_attempts {
            self.max_attempts = attempts;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fibonacci_backoff_sequence_caps_at_max() {
        let mut backoff = FibonacciBackoff::new(1, 10);

        // 1m, 1m, 2m, 3m, 5m, 8m, 10m (max), 10m
        assert_eq!(backoff.next_backoff_seconds(), 60);
        assert_eq!(backoff.next_backoff_seconds(), 60);
        assert_eq!(backoff.next_backoff_seconds(), 120);
        assert_eq!(backoff.next_backoff_seconds(), 180);
        assert_eq!(backoff.next_backoff_seconds(), 300);
        assert_eq!(backoff.next_backoff_seconds(), 480);
        assert_eq!(backoff.next_backoff_seconds(), 600);
        assert_eq!(backoff.next_backoff_seconds(), 600);
    }

    #[test]
    fn test_fibonacci_backoff_reset() {
        let mut backoff = FibonacciBackoff::new(1, 10);
        backoff.next_backoff_seconds();
        backoff.next_backoff_seconds();
        backoff.next_backoff_seconds();

        backoff.reset();

        assert_eq!(backoff.next_backoff(), Duration::from_secs(60));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(60));
    }

    #[test]
    fn test_fibonacci_retry_exhausts_after_max_attempts() {
        let retry = FibonacciRetry::new(1, 10, 2);
        let mut execution = retry.init_execution();
        assert_eq!(execution.next_delay(), Some(Duration::from_secs(60)));
        assert!(!execution.is_last_attempt());
        assert_eq!(execution.next_delay(), Some(Duration::from_secs(60)));
        assert!(execution.is_last_attempt());
        assert_eq!(execution.next_delay(), None);
        assert_eq!(execution.attempt_count(), 2);
    }

    #[test]
    fn test_fibonacci_config_block() {
        let mut retry = FibonacciRetry::default();
        retry.init_from(FibonacciBackoffConfig {
            min_minutes: Some(2),
            max_minutes: None,
            max_attempts: Some(1),
        });
        assert_eq!(retry, FibonacciRetry::new(2, 10, 1));
    }
}
