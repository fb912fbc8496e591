//! # Rate Limiting
//!
//! Caps how many reconciliations a single resource may trigger within a
//! refresh period. The scheduler keeps one [`RateState`] per resource and
//! asks the limiter before every dispatch.

use crate::configuration::duration::TimeUnit;
use crate::constants::{DEFAULT_LIMIT_FOR_PERIOD, DEFAULT_REFRESH_PERIOD_SECS};
use crate::registry::{ConfigBlock, Configurable};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::{Duration, Instant};

/// Per-resource counter for the current refresh period
#[derive(Debug, Clone)]
pub struct RateState {
    period_start: Instant,
    count: u32,
}

impl RateState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            period_start: Instant::now(),
            count: 0,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    fn elapsed(&self) -> Duration {
        self.period_start.elapsed()
    }

    fn reset(&mut self) {
        self.period_start = Instant::now();
        self.count = 0;
    }
}

impl Default for RateState {
    fn default() -> Self {
        Self::new()
    }
}

pub trait RateLimiter: Debug + Send + Sync {
    fn init_state(&self) -> RateState {
        RateState::new()
    }

    /// Returns how long to wait when the resource is over its limit
    fn is_limited(&self, state: &mut RateState) -> Option<Duration>;
}

/// Fixed window limiter allowing `limit_for_period` reconciliations per
/// `refresh_period`
///
/// A zero limit or a zero period deactivates the limiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearRateLimiter {
    refresh_period: Duration,
    limit_for_period: u32,
}

impl Default for LinearRateLimiter {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_REFRESH_PERIOD_SECS),
            DEFAULT_LIMIT_FOR_PERIOD,
        )
    }
}

impl LinearRateLimiter {
    #[must_use]
    pub fn new(refresh_period: Duration, limit_for_period: u32) -> Self {
        Self {
            refresh_period,
            limit_for_period,
        }
    }

    #[must_use]
    pub fn deactivated() -> Self {
        Self::new(Duration::ZERO, 0)
    }

    pub fn is_activated(&self) -> bool {
        self.limit_for_period > 0 && !self.refresh_period.is_zero()
    }

    pub fn refresh_period(&self) -> Duration {
        self.refresh_period
    }

    pub fn limit_for_period(&self) -> u32 {
        self.limit_for_period
    }
}

impl RateLimiter for LinearRateLimiter {
    fn is_limited(&self, state: &mut RateState) -> Option<Duration> {
        if !self.is_activated() {
            return None;
        }
        let mut elapsed = state.elapsed();
        if elapsed >= self.refresh_period {
            state.reset();
            elapsed = Duration::ZERO;
        }
        state.count = state.count.saturating_add(1);
        if state.count > self.limit_for_period {
            Some(self.refresh_period.saturating_sub(elapsed))
        } else {
            None
        }
    }
}

/// `rateLimited` configuration block for [`LinearRateLimiter`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateLimited {
    pub max_reconciliations: u32,
    pub within: u64,
    #[serde(default = "default_rate_unit")]
    pub unit: TimeUnit,
}

fn default_rate_unit() -> TimeUnit {
    TimeUnit::Seconds
}

impl ConfigBlock for RateLimited {
    const KEY: &'static str = "rateLimited";
}

impl Configurable<RateLimited> for LinearRateLimiter {
    fn init_from(&mut self, config: RateLimited) {
        self.limit_for_period = config.max_reconciliations;
        self.refresh_period = config.unit.to_duration(config.within);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_after_period_quota() {
        let limiter = LinearRateLimiter::new(Duration::from_secs(60), 2);
        let mut state = limiter.init_state();
        assert_eq!(limiter.is_limited(&mut state), None);
        assert_eq!(limiter.is_limited(&mut state), None);
        let delay = limiter.is_limited(&mut state);
        assert!(matches!(delay, Some(d) if d <= Duration::from_secs(60) && d > Duration::ZERO));
        assert_eq!(state.count(), 3);
    }

    #[test]
    fn test_deactivated_never_limits() {
        let limiter = LinearRateLimiter::deactivated();
        assert!(!limiter.is_activated());
        let mut state = limiter.init_state();
        for _ in 0..100 {
            assert_eq!(limiter.is_limited(&mut state), None);
        }
    }

    #[test]
    fn test_rate_limited_block() {
        let mut limiter = LinearRateLimiter::default();
        limiter.init_from(RateLimited {
            max_reconciliations: 7,
            within: 2,
            unit: TimeUnit::Minutes,
        });
        assert_eq!(limiter.limit_for_period(), 7);
        assert_eq!(limiter.refresh_period(), Duration::from_secs(120));
    }
}
