//! # API
//!
//! Everything user code touches: the [`Reconciler`] trait, the controls its
//! hooks return, filters, gating conditions and resource metadata helpers.

pub mod condition;
pub mod control;
pub mod filter;
pub mod reconciler;
pub mod resource;

pub use condition::{Condition, ConditionKind};
pub use control::{DeleteControl, ReprocessControl, UpdateAction, UpdateControl};
pub use filter::{
    AndFilter, GenerationChanged, GenericFilter, MarkedForDeletion, NotFilter, OnAddFilter,
    OnDeleteFilter, OnUpdateFilter, OrFilter, Passthrough, RejectAll, ResourceEventFilter,
};
pub use reconciler::{default_reconciler_name, Context, Reconciler, RetryInfo};
