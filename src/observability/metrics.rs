//! # Metrics
//!
//! Prometheus metrics for monitoring event dispatch.
//!
//! ## Metrics Exposed
//!
//! - `operator_dispatches_total{outcome}` - Dispatches by outcome (`default`, `reprocess`, `error`)
//! - `operator_dispatch_errors_total` - Dispatches that failed
//! - `operator_dispatch_duration_seconds` - Duration of a single dispatch
//! - `operator_finalizers_added_total` - Finalizers attached to resources
//! - `operator_finalizers_removed_total` - Finalizers released after cleanup
//! - `operator_generation_skips_total` - Events skipped because their generation was already processed

use anyhow::Result;
use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static DISPATCHES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new("operator_dispatches_total", "Total number of event dispatches by outcome"),
        &["outcome"],
    )
    .expect("Failed to create DISPATCHES_TOTAL metric - this should never happen")
});

static DISPATCH_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "operator_dispatch_errors_total",
        "Total number of dispatches that ended in an error",
    )
    .expect("Failed to create DISPATCH_ERRORS_TOTAL metric - this should never happen")
});

static DISPATCH_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "operator_dispatch_duration_seconds",
            "Duration of event dispatch in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
    )
    .expect("Failed to create DISPATCH_DURATION metric - this should never happen")
});

static FINALIZERS_ADDED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "operator_finalizers_added_total",
        "Total number of finalizers attached to resources",
    )
    .expect("Failed to create FINALIZERS_ADDED_TOTAL metric - this should never happen")
});

static FINALIZERS_REMOVED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "operator_finalizers_removed_total",
        "Total number of finalizers removed after cleanup",
    )
    .expect("Failed to create FINALIZERS_REMOVED_TOTAL metric - this should never happen")
});

static GENERATION_SKIPS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "operator_generation_skips_total",
        "Total number of events skipped because the generation was already processed",
    )
    .expect("Failed to create GENERATION_SKIPS_TOTAL metric - this should never happen")
});

/// Register all metrics with the crate registry
///
/// Registering twice is not an error.
pub fn register_metrics() -> Result<()> {
    register(Box::new(DISPATCHES_TOTAL.clone()))?;
    register(Box::new(DISPATCH_ERRORS_TOTAL.clone()))?;
    register(Box::new(DISPATCH_DURATION.clone()))?;
    register(Box::new(FINALIZERS_ADDED_TOTAL.clone()))?;
    register(Box::new(FINALIZERS_REMOVED_TOTAL.clone()))?;
    register(Box::new(GENERATION_SKIPS_TOTAL.clone()))?;

    Ok(())
}

fn register(collector: Box<dyn prometheus::core::Collector>) -> Result<()> {
    match REGISTRY.register(collector) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Text exposition of every registered metric
pub fn render_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn increment_dispatches(outcome: &str) {
    DISPATCHES_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn increment_dispatch_errors() {
    DISPATCH_ERRORS_TOTAL.inc();
}

pub fn observe_dispatch_duration(duration: f64) {
    DISPATCH_DURATION.observe(duration);
}

pub fn increment_finalizers_added() {
    FINALIZERS_ADDED_TOTAL.inc();
}

pub fn increment_finalizers_removed() {
    FINALIZERS_REMOVED_TOTAL.inc();
}

pub fn increment_generation_skips() {
    GENERATION_SKIPS_TOTAL.inc();
}
