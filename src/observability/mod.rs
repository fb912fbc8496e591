//! # Observability
//!
//! - `logging`: `tracing` subscriber setup
//! - `metrics`: Prometheus metrics collection

pub mod logging;
pub mod metrics;

pub use logging::{init_tracing, log_filter};
pub use metrics::{register_metrics, render_metrics};

use crate::config::OperatorConfig;
use anyhow::Result;

/// Initialize logging and, when enabled, metrics
pub fn init(config: &OperatorConfig) -> Result<()> {
    init_tracing(config)?;
    if config.enable_metrics {
        register_metrics()?;
    }
    Ok(())
}
