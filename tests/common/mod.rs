//! # Common Test Fixtures
//!
//! A `Widget` custom resource plus a reconciler and persistence facade that
//! record every call, so dispatcher behaviour can be asserted without a
//! cluster.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::CustomResource;
use operator_core::dispatch::FacadeError;
use operator_core::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const WIDGET_FINALIZER: &str = "widgets.sample.operator.io/finalizer";

#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "sample.operator.io",
    version = "v1",
    kind = "Widget",
    namespaced,
    status = "WidgetStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSpec {
    pub replicas: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WidgetStatus {
    pub observed_generation: Option<i64>,
    pub ready: bool,
}

/// A live widget in namespace `apps` with a uid derived from its name
pub fn widget(name: &str, generation: i64) -> Widget {
    let mut widget = Widget::new(name, WidgetSpec { replicas: 1 });
    widget.metadata.namespace = Some("apps".to_string());
    widget.metadata.uid = Some(format!("uid-{name}"));
    widget.metadata.generation = Some(generation);
    widget.metadata.resource_version = Some("1".to_string());
    widget
}

pub fn with_finalizer(mut widget: Widget) -> Widget {
    widget
        .metadata
        .finalizers
        .get_or_insert_with(Vec::new)
        .push(WIDGET_FINALIZER.to_string());
    widget
}

pub fn marked_for_deletion(mut widget: Widget) -> Widget {
    let timestamp: Time =
        serde_json::from_value(json!("2024-01-01T00:00:00Z")).expect("valid RFC 3339 timestamp");
    widget.metadata.deletion_timestamp = Some(timestamp);
    widget
}

pub fn finalizers(widget: &Widget) -> Vec<String> {
    widget.metadata.finalizers.clone().unwrap_or_default()
}

#[derive(Debug, Clone)]
pub enum UpsertBehavior {
    NoUpdate,
    UpdateStatus,
    UpdateResource,
    Fail,
    Panic,
    ReprocessAfter(Duration),
}

#[derive(Debug, Clone)]
pub enum DeleteBehavior {
    RemoveFinalizer,
    KeepFinalizer,
    RemoveAndReprocess(Duration),
    Fail,
}

/// Reconciler that records what it was called with
#[derive(Debug)]
pub struct RecordingReconciler {
    upsert_behavior: Mutex<UpsertBehavior>,
    delete_behavior: Mutex<DeleteBehavior>,
    upserts: Mutex<Vec<(Widget, RetryInfo)>>,
    deletes: Mutex<Vec<(Widget, RetryInfo)>>,
}

impl RecordingReconciler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            upsert_behavior: Mutex::new(UpsertBehavior::NoUpdate),
            delete_behavior: Mutex::new(DeleteBehavior::RemoveFinalizer),
            upserts: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
        })
    }

    pub fn on_upsert(&self, behavior: UpsertBehavior) {
        *self.upsert_behavior.lock().unwrap() = behavior;
    }

    pub fn on_delete(&self, behavior: DeleteBehavior) {
        *self.delete_behavior.lock().unwrap() = behavior;
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.lock().unwrap().len()
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.lock().unwrap().len()
    }

    pub fn last_upsert(&self) -> Option<(Widget, RetryInfo)> {
        self.upserts.lock().unwrap().last().cloned()
    }

    pub fn last_delete(&self) -> Option<(Widget, RetryInfo)> {
        self.deletes.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Reconciler<Widget> for RecordingReconciler {
    fn name(&self) -> String {
        "widget".to_string()
    }

    async fn upsert(
        &self,
        resource: Widget,
        context: &Context,
    ) -> anyhow::Result<UpdateControl<Widget>> {
        self.upserts
            .lock()
            .unwrap()
            .push((resource.clone(), *context.retry_info()));
        let behavior = self.upsert_behavior.lock().unwrap().clone();

        match behavior {
            UpsertBehavior::NoUpdate => Ok(UpdateControl::no_update()),
            UpsertBehavior::UpdateStatus => {
                let mut resource = resource;
                resource.status = Some(WidgetStatus {
                    observed_generation: resource.metadata.generation,
                    ready: true,
                });
                Ok(UpdateControl::update_status(resource))
            }
            UpsertBehavior::UpdateResource => {
                let mut resource = resource;
                resource.spec.replicas += 1;
                Ok(UpdateControl::update_resource(resource))
            }
            UpsertBehavior::Fail => Err(anyhow::anyhow!("backing store unavailable")),
            UpsertBehavior::Panic => panic!("widget reconciler blew up"),
            UpsertBehavior::ReprocessAfter(delay) => {
                Ok(UpdateControl::no_update().reprocess_after(delay))
            }
        }
    }

    async fn delete(&self, resource: Widget, context: &Context) -> anyhow::Result<DeleteControl> {
        self.deletes
            .lock()
            .unwrap()
            .push((resource, *context.retry_info()));
        let behavior = self.delete_behavior.lock().unwrap().clone();

        match behavior {
            DeleteBehavior::RemoveFinalizer => Ok(DeleteControl::default_delete()),
            DeleteBehavior::KeepFinalizer => Ok(DeleteControl::no_finalizer_removal()),
            DeleteBehavior::RemoveAndReprocess(delay) => {
                Ok(DeleteControl::default_delete().reprocess_after(delay))
            }
            DeleteBehavior::Fail => Err(anyhow::anyhow!("cleanup failed")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    UpdateStatus,
    Replace,
}

/// Facade that stores what would have been persisted
#[derive(Debug, Default)]
pub struct RecordingFacade {
    calls: Mutex<Vec<(CallKind, Widget)>>,
    conflict_on_replace: AtomicBool,
}

impl RecordingFacade {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every later replace fails with an optimistic lock conflict
    pub fn fail_replace_with_conflict(&self) {
        self.conflict_on_replace.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(CallKind, Widget)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_kinds(&self) -> Vec<CallKind> {
        self.calls().into_iter().map(|(kind, _)| kind).collect()
    }

    pub fn last_persisted(&self) -> Option<Widget> {
        self.calls().pop().map(|(_, widget)| widget)
    }
}

#[async_trait]
impl ResourceFacade<Widget> for RecordingFacade {
    async fn update_status(&self, resource: &Widget) -> Result<Widget, FacadeError> {
        self.calls
            .lock()
            .unwrap()
            .push((CallKind::UpdateStatus, resource.clone()));
        Ok(resource.clone())
    }

    async fn replace_with_lock(&self, resource: &Widget) -> Result<Widget, FacadeError> {
        self.calls
            .lock()
            .unwrap()
            .push((CallKind::Replace, resource.clone()));
        if self.conflict_on_replace.load(Ordering::SeqCst) {
            return Err(FacadeError::Conflict {
                resource: format!(
                    "apps/{}",
                    resource.metadata.name.clone().unwrap_or_default()
                ),
                resource_version: resource.metadata.resource_version.clone(),
            });
        }
        Ok(resource.clone())
    }
}

pub fn dispatcher(
    reconciler: &Arc<RecordingReconciler>,
    facade: &Arc<RecordingFacade>,
    generation_aware: bool,
) -> EventDispatcher<Widget> {
    let reconciler: Arc<dyn Reconciler<Widget>> = Arc::<RecordingReconciler>::clone(reconciler);
    let facade: Arc<dyn ResourceFacade<Widget>> = Arc::<RecordingFacade>::clone(facade);
    EventDispatcher::new(reconciler, facade, WIDGET_FINALIZER, generation_aware)
}
