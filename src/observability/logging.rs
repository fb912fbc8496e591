//! # Logging
//!
//! `tracing` subscriber setup. `RUST_LOG` wins when set; otherwise the
//! operator's `LOG_LEVEL` applies to this crate.

use crate::config::OperatorConfig;
use crate::constants::DEFAULT_LOG_FILTER;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Filter directive for the configured log level
#[must_use]
pub fn log_filter(config: &OperatorConfig) -> String {
    let level = config.log_level.trim().to_lowercase();
    match level.as_str() {
        "error" | "warn" | "info" | "debug" | "trace" => format!("operator_core={level}"),
        _ => DEFAULT_LOG_FILTER.to_string(),
    }
}

/// Install the global `tracing` subscriber
pub fn init_tracing(config: &OperatorConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_filter(config)))
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.log_enable_color)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_from_level() {
        let config = OperatorConfig {
            log_level: "DEBUG".to_string(),
            ..OperatorConfig::default()
        };
        assert_eq!(log_filter(&config), "operator_core=debug");
    }

    #[test]
    fn test_unknown_level_falls_back() {
        let config = OperatorConfig {
            log_level: "chatty".to_string(),
            ..OperatorConfig::default()
        };
        assert_eq!(log_filter(&config), DEFAULT_LOG_FILTER);
    }
}
