//! # Reconciler Controls
//!
//! Intents returned by reconciler hooks: what to persist and whether the
//! resource should be processed again after a delay.

use std::time::Duration;

/// Shared shape of the reprocess request carried by both controls
pub trait ReprocessControl {
    /// Delay after which the resource should be processed again, if requested
    fn reprocess_delay(&self) -> Option<Duration>;
}

/// What the dispatcher should persist after an upsert
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction<K> {
    /// Persist nothing
    NoUpdate,
    /// Persist only the status subresource
    UpdateStatus(K),
    /// Persist the full resource with an optimistic-lock replace
    UpdateResource(K),
}

/// Result of [`crate::api::Reconciler::upsert`]
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateControl<K> {
    action: UpdateAction<K>,
    reprocess_after: Option<Duration>,
}

impl<K> UpdateControl<K> {
    #[must_use]
    pub fn no_update() -> Self {
        Self {
            action: UpdateAction::NoUpdate,
            reprocess_after: None,
        }
    }

    /// Persist the status of `resource` only
    #[must_use]
    pub fn update_status(resource: K) -> Self {
        Self {
            action: UpdateAction::UpdateStatus(resource),
            reprocess_after: None,
        }
    }

    /// Replace the whole `resource`, conditioned on its resource version
    #[must_use]
    pub fn update_resource(resource: K) -> Self {
        Self {
            action: UpdateAction::UpdateResource(resource),
            reprocess_after: None,
        }
    }

    /// Ask for the resource to be processed again after `delay`
    #[must_use]
    pub fn reprocess_after(mut self, delay: Duration) -> Self {
        self.reprocess_after = Some(delay);
        self
    }

    pub fn is_update_status(&self) -> bool {
        matches!(self.action, UpdateAction::UpdateStatus(_))
    }

    pub fn is_update_resource(&self) -> bool {
        matches!(self.action, UpdateAction::UpdateResource(_))
    }

    pub fn action(&self) -> &UpdateAction<K> {
        &self.action
    }

    pub fn into_action(self) -> UpdateAction<K> {
        self.action
    }
}

impl<K> ReprocessControl for UpdateControl<K> {
    fn reprocess_delay(&self) -> Option<Duration> {
        self.reprocess_after
    }
}

/// Result of [`crate::api::Reconciler::delete`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteControl {
    remove_finalizer: bool,
    reprocess_after: Option<Duration>,
}

impl DeleteControl {
    /// Cleanup is complete, release the resource
    #[must_use]
    pub fn default_delete() -> Self {
        Self {
            remove_finalizer: true,
            reprocess_after: None,
        }
    }

    /// Cleanup is still in progress, keep the finalizer
    #[must_use]
    pub fn no_finalizer_removal() -> Self {
        Self {
            remove_finalizer: false,
            reprocess_after: None,
        }
    }

    #[must_use]
    pub fn reprocess_after(mut self, delay: Duration) -> Self {
        self.reprocess_after = Some(delay);
        self
    }

    pub fn is_remove_finalizer(&self) -> bool {
        self.remove_finalizer
    }
}

impl Default for DeleteControl {
    fn default() -> Self {
        Self::default_delete()
    }
}

impl ReprocessControl for DeleteControl {
    fn reprocess_delay(&self) -> Option<Duration> {
        self.reprocess_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_control_flags() {
        let status = UpdateControl::update_status("r");
        assert!(status.is_update_status());
        assert!(!status.is_update_resource());

        let full = UpdateControl::update_resource("r").reprocess_after(Duration::from_secs(5));
        assert!(full.is_update_resource());
        assert_eq!(full.reprocess_delay(), Some(Duration::from_secs(5)));

        let none = UpdateControl::<&str>::no_update();
        assert_eq!(none.action(), &UpdateAction::NoUpdate);
        assert_eq!(none.reprocess_delay(), None);
    }

    #[test]
    fn test_delete_control_defaults_to_removal() {
        assert!(DeleteControl::default().is_remove_finalizer());
        let keep = DeleteControl::no_finalizer_removal().reprocess_after(Duration::from_secs(30));
        assert!(!keep.is_remove_finalizer());
        assert_eq!(keep.reprocess_delay(), Some(Duration::from_secs(30)));
    }
}
