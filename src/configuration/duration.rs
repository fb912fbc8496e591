//! # Interval Declarations
//!
//! Parses the `maxReconciliationInterval` value of a declaration. It is
//! written either as a structured `{interval, timeUnit}` pair or as a
//! Kubernetes-style duration string such as `"30s"`, `"5m"`, `"10h"`.

use anyhow::Result;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    #[default]
    Hours,
    Days,
}

impl TimeUnit {
    #[must_use]
    pub fn to_duration(self, amount: u64) -> Duration {
        match self {
            TimeUnit::Milliseconds => Duration::from_millis(amount),
            TimeUnit::Seconds => Duration::from_secs(amount),
            TimeUnit::Minutes => Duration::from_secs(amount.saturating_mul(60)),
            TimeUnit::Hours => Duration::from_secs(amount.saturating_mul(3600)),
            TimeUnit::Days => Duration::from_secs(amount.saturating_mul(86400)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum IntervalDeclaration {
    #[serde(rename_all = "camelCase")]
    Structured {
        interval: u64,
        #[serde(default)]
        time_unit: TimeUnit,
    },
    Text(String),
}

impl IntervalDeclaration {
    /// Resolve to a duration; a zero interval means no maximum
    pub fn resolve(&self) -> Result<Option<Duration>> {
        match self {
            IntervalDeclaration::Structured { interval, time_unit } => {
                Ok((*interval > 0).then(|| time_unit.to_duration(*interval)))
            }
            IntervalDeclaration::Text(text) => parse_interval(text),
        }
    }
}

/// Parse a duration string into an optional interval
/// Supports formats: "500ms", "30s", "5m", "1h", "1d"
/// A zero amount resolves to `None`
pub fn parse_interval(duration_str: &str) -> Result<Option<Duration>> {
    let duration_trimmed = duration_str.trim();

    if duration_trimmed.is_empty() {
        return Err(anyhow::anyhow!("Duration string cannot be empty"));
    }

    let duration_regex = Regex::new(r"^(?P<number>\d+)(?P<unit>ms|[smhd])$")
        .map_err(|e| anyhow::anyhow!("Failed to compile regex: {e}"))?;

    let interval_lower = duration_trimmed.to_lowercase();

    let captures = duration_regex.captures(&interval_lower).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid duration format '{}'. Expected format: <number><unit> (e.g., '30s', '5m', '1h')",
            duration_trimmed
        )
    })?;

    let number_str = captures
        .name("number")
        .ok_or_else(|| anyhow::anyhow!("Failed to extract number from duration '{duration_trimmed}'"))?
        .as_str();
    let unit = captures
        .name("unit")
        .ok_or_else(|| anyhow::anyhow!("Failed to extract unit from duration '{duration_trimmed}'"))?
        .as_str();

    let number: u64 = number_str.parse().map_err(|e| {
        anyhow::anyhow!("Invalid duration number '{number_str}' in '{duration_trimmed}': {e}")
    })?;

    if number == 0 {
        return Ok(None);
    }

    let time_unit = match unit {
        "ms" => TimeUnit::Milliseconds,
        "s" => TimeUnit::Seconds,
        "m" => TimeUnit::Minutes,
        "h" => TimeUnit::Hours,
        "d" => TimeUnit::Days,
        _ => {
            return Err(anyhow::anyhow!(
                "Invalid unit '{unit}' in duration '{duration_trimmed}'. Expected: ms, s, m, h, or d"
            ));
        }
    };

    Ok(Some(time_unit.to_duration(number)))
}
