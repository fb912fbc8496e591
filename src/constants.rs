//! # Constants
//!
//! Shared constants used throughout the operator core.
//!
//! These values represent reasonable defaults and can be overridden via
//! declarations or environment variables where applicable.

/// Suffix appended to `<plural>.<group>` to build the default finalizer name
pub const FINALIZER_NAME_SUFFIX: &str = "/finalizer";

/// Registry identifier of the rate limiter used when a declaration names none
pub const DEFAULT_RATE_LIMITER: &str = "linear";

/// Registry identifier of the retry policy used when a declaration names none
pub const DEFAULT_RETRY: &str = "generic";

/// Default number of reconciliations allowed per refresh period
pub const DEFAULT_LIMIT_FOR_PERIOD: u32 = 3;

/// Default rate limiter refresh period (seconds)
pub const DEFAULT_REFRESH_PERIOD_SECS: u64 = 10;

/// Default maximum number of retry attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default initial retry interval (milliseconds)
pub const DEFAULT_INITIAL_INTERVAL_MS: u64 = 2000;

/// Default multiplier applied to the retry interval after each attempt
pub const DEFAULT_INTERVAL_MULTIPLIER: f64 = 1.5;

/// Fibonacci retry minimum (minutes)
pub const DEFAULT_FIBONACCI_MIN_MINUTES: u64 = 1;

/// Fibonacci retry maximum (minutes)
pub const DEFAULT_FIBONACCI_MAX_MINUTES: u64 = 10;

/// Fibonacci retry attempt budget before the execution reports exhaustion
pub const DEFAULT_FIBONACCI_MAX_ATTEMPTS: u32 = 10;

/// Maximum length of a finalizer's domain prefix
pub const MAX_FINALIZER_PREFIX_LEN: usize = 253;

/// Default tracing filter when `RUST_LOG` and `LOG_LEVEL` are unset
pub const DEFAULT_LOG_FILTER: &str = "operator_core=info";
