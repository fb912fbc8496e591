//! # Gating Conditions
//!
//! Predicates attached to dependent resources. The workflow executor checks a
//! reconcile precondition before acting on a dependent, a ready postcondition
//! after reconciling it and a delete postcondition after deleting it.

use kube::api::DynamicObject;
use std::fmt::Debug;

/// A gating condition on a dependent resource
///
/// `secondary` is the dependent's current state, if it exists in the store.
pub trait Condition<K>: Debug + Send + Sync {
    fn is_met(&self, primary: &K, secondary: Option<&DynamicObject>) -> bool;
}

/// Which gate a condition is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    ReconcilePrecondition,
    ReadyPostcondition,
    DeletePostcondition,
}

impl ConditionKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::ReconcilePrecondition => "reconcile precondition",
            ConditionKind::ReadyPostcondition => "ready postcondition",
            ConditionKind::DeletePostcondition => "delete postcondition",
        }
    }
}

impl std::fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
