//! # Policies
//!
//! Retry and rate-limit policies selected by identifier in a controller
//! declaration.

pub mod backoff;
pub mod rate_limit;
pub mod retry;

pub use backoff::{FibonacciBackoff, FibonacciBackoffConfig, FibonacciRetry};
pub use rate_limit::{LinearRateLimiter, RateLimited, RateLimiter, RateState};
pub use retry::{GenericRetry, GradualRetry, Retry, RetryExecution};
