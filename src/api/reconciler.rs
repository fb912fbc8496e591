//! # Reconciler Contract
//!
//! The trait user code implements, plus the context handed to every hook.

use crate::api::control::{DeleteControl, UpdateControl};
use async_trait::async_trait;

/// Retry metadata of the event being dispatched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryInfo {
    attempt_count: u32,
    last_attempt: bool,
}

impl RetryInfo {
    #[must_use]
    pub fn new(attempt_count: u32, last_attempt: bool) -> Self {
        Self {
            attempt_count,
            last_attempt,
        }
    }

    /// Number of retries already made for this resource (0 on the first delivery)
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// True when the retry policy will not schedule another attempt after this one
    pub fn is_last_attempt(&self) -> bool {
        self.last_attempt
    }
}

/// Context passed to reconciler hooks
#[derive(Debug, Clone, Default)]
pub struct Context {
    retry_info: RetryInfo,
}

impl Context {
    #[must_use]
    pub fn new(retry_info: RetryInfo) -> Self {
        Self { retry_info }
    }

    pub fn retry_info(&self) -> &RetryInfo {
        &self.retry_info
    }
}

/// User reconciliation logic for resources of type `K`
///
/// The dispatcher guarantees that `upsert` only sees resources that already
/// carry the controller's finalizer, and that `delete` only sees resources
/// that are marked for deletion and still carry it.
#[async_trait]
pub trait Reconciler<K>: Send + Sync
where
    K: Send + 'static,
{
    /// Name used for configuration lookup and in error messages
    ///
    /// Defaults to the lowercased type name of the implementor.
    fn name(&self) -> String {
        default_reconciler_name(std::any::type_name::<Self>())
    }

    /// Drive the resource toward its desired state
    async fn upsert(&self, resource: K, context: &Context) -> anyhow::Result<UpdateControl<K>>;

    /// Release whatever the resource owns before it leaves the store
    async fn delete(&self, _resource: K, _context: &Context) -> anyhow::Result<DeleteControl> {
        Ok(DeleteControl::default_delete())
    }
}

/// Derive a reconciler name from a fully qualified type name
///
/// `my_operator::reconcilers::WidgetReconciler<Foo>` becomes `widgetreconciler`.
pub fn default_reconciler_name(type_name: &str) -> String {
    let without_generics = type_name.split('<').next().unwrap_or(type_name);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .to_lowercase()
}
