//! # Dispatch Outcomes

use crate::api::control::ReprocessControl;
use kube_runtime::controller::Action;
use std::time::Duration;

/// What the scheduler should do after a dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchControl {
    /// Nothing further; wait for the next change
    #[default]
    Default,
    /// Dispatch the resource again after the delay
    ReprocessAfter(Duration),
    /// The dispatch failed; the scheduler applies its retry policy
    ErrorDuringDispatch,
}

impl DispatchControl {
    pub fn from_reprocess(control: &impl ReprocessControl) -> Self {
        match control.reprocess_delay() {
            Some(delay) => DispatchControl::ReprocessAfter(delay),
            None => DispatchControl::Default,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DispatchControl::ErrorDuringDispatch)
    }

    pub fn reprocess_delay(&self) -> Option<Duration> {
        match self {
            DispatchControl::ReprocessAfter(delay) => Some(*delay),
            _ => None,
        }
    }

    /// Metric label for this outcome
    pub fn outcome(&self) -> &'static str {
        match self {
            DispatchControl::Default => "default",
            DispatchControl::ReprocessAfter(_) => "reprocess",
            DispatchControl::ErrorDuringDispatch => "error",
        }
    }

    /// The `kube_runtime` action for successful outcomes
    ///
    /// Errors map to `None`; the caller decides the delay from its retry
    /// policy.
    pub fn to_action(&self) -> Option<Action> {
        match self {
            DispatchControl::Default => Some(Action::await_change()),
            DispatchControl::ReprocessAfter(delay) => Some(Action::requeue(*delay)),
            DispatchControl::ErrorDuringDispatch => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::control::{DeleteControl, UpdateControl};
    use k8s_openapi::api::core::v1::ConfigMap;

    #[test]
    fn test_from_reprocess() {
        let update = UpdateControl::<ConfigMap>::no_update().reprocess_after(Duration::from_secs(30));
        assert_eq!(
            DispatchControl::from_reprocess(&update),
            DispatchControl::ReprocessAfter(Duration::from_secs(30))
        );
        assert_eq!(
            DispatchControl::from_reprocess(&DeleteControl::default_delete()),
            DispatchControl::Default
        );
    }

    #[test]
    fn test_to_action() {
        assert_eq!(
            DispatchControl::ReprocessAfter(Duration::from_secs(5)).to_action(),
            Some(Action::requeue(Duration::from_secs(5)))
        );
        assert_eq!(DispatchControl::Default.to_action(), Some(Action::await_change()));
        assert_eq!(DispatchControl::ErrorDuringDispatch.to_action(), None);
    }
}
