//! # Config
//!
//! Process-level operator settings. Per-reconciler declarations live in
//! [`crate::configuration`].

mod operator;

pub use operator::OperatorConfig;
