//! # Operator Configuration
//!
//! Process-level settings loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Operator-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Per-reconciler behaviour lives in [`crate::configuration::ControllerDeclaration`];
/// this struct only carries what is shared by every controller in the process.
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Enable ANSI color in log output
    pub log_enable_color: bool,
    /// Enable metrics collection
    pub enable_metrics: bool,
    /// Path to a YAML file holding reconciler declarations, if any
    pub declarations_path: Option<PathBuf>,
    /// Default rate limiter limit per refresh period
    /// Used by `linear` rate limiters without a `RateLimited` block
    pub rate_limit_per_period: u32,
    /// Default rate limiter refresh period (seconds)
    pub rate_limit_refresh_period_secs: u64,
    /// Default maximum retry attempts for the `generic` retry
    pub retry_max_attempts: u32,
    /// Default initial retry interval (milliseconds)
    pub retry_initial_interval_ms: u64,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            log_level: "INFO".to_string(),
            log_enable_color: false,
            enable_metrics: true,
            declarations_path: None,
            rate_limit_per_period: DEFAULT_LIMIT_FOR_PERIOD,
            rate_limit_refresh_period_secs: DEFAULT_REFRESH_PERIOD_SECS,
            retry_max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_initial_interval_ms: DEFAULT_INITIAL_INTERVAL_MS,
        }
    }
}

impl OperatorConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// `from_env` delegates here; tests pass a map-backed closure instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        use crate::constants::*;
        Self {
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "INFO".to_string()),
            log_enable_color: parse_bool(lookup("LOG_ENABLE_COLOR"), false),
            enable_metrics: parse_bool(lookup("ENABLE_METRICS"), true),
            declarations_path: lookup("CONTROLLER_DECLARATIONS_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            rate_limit_per_period: parse_or(
                lookup("RATE_LIMIT_PER_PERIOD"),
                DEFAULT_LIMIT_FOR_PERIOD,
            ),
            rate_limit_refresh_period_secs: parse_or(
                lookup("RATE_LIMIT_REFRESH_PERIOD_SECS"),
                DEFAULT_REFRESH_PERIOD_SECS,
            ),
            retry_max_attempts: parse_or(lookup("RETRY_MAX_ATTEMPTS"), DEFAULT_MAX_ATTEMPTS),
            retry_initial_interval_ms: parse_or(
                lookup("RETRY_INITIAL_INTERVAL_MS"),
                DEFAULT_INITIAL_INTERVAL_MS,
            ),
        }
    }

    /// Get rate limiter refresh period duration
    #[must_use]
    pub fn rate_limit_refresh_period(&self) -> Duration {
        Duration::from_secs(self.rate_limit_refresh_period_secs)
    }

    /// Get initial retry interval duration
    #[must_use]
    pub fn retry_initial_interval(&self) -> Duration {
        Duration::from_millis(self.retry_initial_interval_ms)
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}
