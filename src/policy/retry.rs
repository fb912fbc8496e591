//! # Retry Policies
//!
//! A [`Retry`] hands out one [`RetryExecution`] per failing resource. The
//! scheduler asks the execution for the next delay after every failed
//! dispatch and copies its attempt count and last-attempt flag into the next
//! event it delivers.

use crate::constants::{DEFAULT_INITIAL_INTERVAL_MS, DEFAULT_INTERVAL_MULTIPLIER, DEFAULT_MAX_ATTEMPTS};
use crate::registry::{ConfigBlock, Configurable};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

/// Factory for per-resource retry executions
pub trait Retry: Debug + Send + Sync {
    fn init_execution(&self) -> Box<dyn RetryExecution>;
}

/// Retry state for a single resource
pub trait RetryExecution: Debug + Send {
    /// Delay before the next attempt, or `None` once attempts are exhausted
    fn next_delay(&mut self) -> Option<Duration>;

    fn is_last_attempt(&self) -> bool;

    fn attempt_count(&self) -> u32;
}

/// Exponential retry with a capped number of attempts
#[derive(Debug, Clone, PartialEq)]
pub struct GenericRetry {
    max_attempts: u32,
    initial_interval: Duration,
    interval_multiplier: f64,
    max_interval: Option<Duration>,
}

impl Default for GenericRetry {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_interval: Duration::from_millis(DEFAULT_INITIAL_INTERVAL_MS),
            interval_multiplier: DEFAULT_INTERVAL_MULTIPLIER,
            max_interval: None,
        }
    }
}

impl GenericRetry {
    /// A retry that never schedules another attempt
    #[must_use]
    pub fn no_retry() -> Self {
        Self::default().with_max_attempts(0)
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    #[must_use]
    pub fn with_interval_multiplier(mut self, multiplier: f64) -> Self {
        self.interval_multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn with_max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = Some(max_interval);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_interval(&self) -> Duration {
        self.initial_interval
    }

    pub fn interval_multiplier(&self) -> f64 {
        self.interval_multiplier
    }

    pub fn max_interval(&self) -> Option<Duration> {
        self.max_interval
    }
}

impl Retry for GenericRetry {
    fn init_execution(&self) -> Box<dyn RetryExecution> {
        Box::new(GenericRetryExecution {
            current_interval: self.initial_interval,
            retry: self.clone(),
            last_attempt_index: 0,
        })
    }
}

#[derive(Debug)]
struct GenericRetryExecution {
    retry: GenericRetry,
    last_attempt_index: u32,
    current_interval: Duration,
}

impl RetryExecution for GenericRetryExecution {
    fn next_delay(&mut self) -> Option<Duration> {
        if self.last_attempt_index >= self.retry.max_attempts {
            return None;
        }
        if self.last_attempt_index > 0 {
            let scaled = self.current_interval.as_secs_f64() * self.retry.interval_multiplier;
            self.current_interval =
                Duration::try_from_secs_f64(scaled).unwrap_or(self.current_interval);
        }
        if let Some(max) = self.retry.max_interval {
            self.current_interval = self.current_interval.min(max);
        }
        self.last_attempt_index += 1;
        Some(self.current_interval)
    }

    fn is_last_attempt(&self) -> bool {
        self.last_attempt_index >= self.retry.max_attempts
    }

    fn attempt_count(&self) -> u32 {
        self.last_attempt_index
    }
}

/// `gradualRetry` configuration block for [`GenericRetry`]
///
/// Unset fields keep the retry's current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GradualRetry {
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub initial_interval_ms: Option<u64>,
    #[serde(default)]
    pub interval_multiplier: Option<f64>,
    #[serde(default)]
    pub max_interval_ms: Option<u64>,
}

impl ConfigBlock for GradualRetry {
    const KEY: &'static str = "gradualRetry";
}

impl Configurable<GradualRetry> for GenericRetry {
    fn init_from(&mut self, config: GradualRetry) {
        if let Some(max_attempts) = config.max_attempts {
            self.max_attempts = max_attempts;
        }
        if let Some(initial) = config.initial_interval_ms {
            self.initial_interval = Duration::from_millis(initial);
        }
        if let Some(multiplier) = config.interval_multiplier {
            self.interval_multiplier = multiplier;
        }
        if let Some(max) = config.max_interval_ms {
            self.max_interval = Some(Duration::from_millis(max));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_retry_sequence() {
        let retry = GenericRetry::default()
            .with_max_attempts(3)
            .with_initial_interval(Duration::from_millis(1000))
            .with_interval_multiplier(2.0);
        let mut execution = retry.init_execution();

        assert_eq!(execution.attempt_count(), 0);
        assert!(!execution.is_last_attempt());
        assert_eq!(execution.next_delay(), Some(Duration::from_millis(1000)));
        assert_eq!(execution.next_delay(), Some(Duration::from_millis(2000)));
        assert_eq!(execution.next_delay(), Some(Duration::from_millis(4000)));
        assert!(execution.is_last_attempt());
        assert_eq!(execution.attempt_count(), 3);
        assert_eq!(execution.next_delay(), None);
    }

    #[test]
    fn test_generic_retry_max_interval_caps_delay() {
        let retry = GenericRetry::default()
            .with_initial_interval(Duration::from_secs(4))
            .with_interval_multiplier(3.0)
            .with_max_interval(Duration::from_secs(10));
        let mut execution = retry.init_execution();
        assert_eq!(execution.next_delay(), Some(Duration::from_secs(4)));
        assert_eq!(execution.next_delay(), Some(Duration::from_secs(10)));
        assert_eq!(execution.next_delay(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_no_retry_is_immediately_exhausted() {
        let mut execution = GenericRetry::no_retry().init_execution();
        assert!(execution.is_last_attempt());
        assert_eq!(execution.next_delay(), None);
    }

    #[test]
    fn test_gradual_retry_only_overrides_set_fields() {
        let mut retry = GenericRetry::default();
        retry.init_from(GradualRetry {
            max_attempts: Some(9),
            max_interval_ms: Some(60_000),
            ..GradualRetry::default()
        });
        assert_eq!(retry.max_attempts(), 9);
        assert_eq!(retry.initial_interval(), Duration::from_millis(2000));
        assert_eq!(retry.max_interval(), Some(Duration::from_secs(60)));
    }
}
