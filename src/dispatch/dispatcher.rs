//! # Event Dispatcher
//!
//! Turns one [`CustomResourceEvent`] into at most one reconciler call and the
//! persistence that follows it.
//!
//! ## Decision order
//!
//! 1. `ERROR` events are logged and dropped
//! 2. Resources marked for deletion without our finalizer are ignored
//! 3. Resources marked for deletion with our finalizer go to the delete hook
//! 4. Live resources without our finalizer get it attached; the upsert hook
//!    runs on the update that attachment triggers
//! 5. Everything else goes to the upsert hook, unless its generation was
//!    already processed
//!
//! Failures never escape [`EventDispatcher::handle_event`]. They are logged
//! with the event and reported as [`DispatchControl::ErrorDuringDispatch`];
//! retrying is the scheduler's job.

use crate::api::control::UpdateAction;
use crate::api::reconciler::{Context, Reconciler, RetryInfo};
use crate::api::resource::{
    add_finalizer, has_finalizer, is_marked_for_deletion, remove_finalizer, resource_key,
};
use crate::configuration::ControllerConfiguration;
use crate::dispatch::control::DispatchControl;
use crate::dispatch::error::DispatchError;
use crate::dispatch::event::{CustomResourceEvent, ResourceAction};
use crate::dispatch::facade::ResourceFacade;
use crate::dispatch::generation::GenerationCache;
use crate::observability::metrics;
use futures::FutureExt;
use kube::{Resource, ResourceExt};
use std::any::Any;
use std::fmt::{self, Debug};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, trace, Instrument};

pub struct EventDispatcher<K>
where
    K: Send + 'static,
{
    reconciler: Arc<dyn Reconciler<K>>,
    facade: Arc<dyn ResourceFacade<K>>,
    finalizer: String,
    generation_aware: bool,
    generations: Arc<GenerationCache>,
}

impl<K> Debug for EventDispatcher<K>
where
    K: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("reconciler", &self.reconciler.name())
            .field("finalizer", &self.finalizer)
            .field("generation_aware", &self.generation_aware)
            .field("cached_generations", &self.generations.len())
            .finish_non_exhaustive()
    }
}

impl<K> EventDispatcher<K>
where
    K: Resource + Clone + Debug + Send + Sync + 'static,
    K::DynamicType: Default,
{
    pub fn new(
        reconciler: Arc<dyn Reconciler<K>>,
        facade: Arc<dyn ResourceFacade<K>>,
        finalizer: impl Into<String>,
        generation_aware: bool,
    ) -> Self {
        Self {
            reconciler,
            facade,
            finalizer: finalizer.into(),
            generation_aware,
            generations: Arc::new(GenerationCache::new()),
        }
    }

    /// Takes finalizer and generation awareness from a resolved configuration
    pub fn from_configuration(
        reconciler: Arc<dyn Reconciler<K>>,
        facade: Arc<dyn ResourceFacade<K>>,
        configuration: &ControllerConfiguration<K>,
    ) -> Self {
        Self::new(
            reconciler,
            facade,
            configuration.finalizer_name(),
            configuration.is_generation_aware(),
        )
    }

    /// Shares a generation cache, e.g. across dispatcher restarts
    #[must_use]
    pub fn with_generation_cache(mut self, generations: Arc<GenerationCache>) -> Self {
        self.generations = generations;
        self
    }

    pub fn generation_cache(&self) -> &Arc<GenerationCache> {
        &self.generations
    }

    pub fn finalizer(&self) -> &str {
        &self.finalizer
    }

    pub fn is_generation_aware(&self) -> bool {
        self.generation_aware
    }

    /// Process one event
    ///
    /// Callers must not dispatch two events for the same resource
    /// concurrently. Events for different resources may run in parallel.
    pub async fn handle_event(&self, event: CustomResourceEvent<K>) -> DispatchControl {
        let start = Instant::now();
        let description = event.to_string();
        let span = info_span!(
            "dispatch",
            resource.name = %event.resource().name_any(),
            resource.namespace = %event.resource().namespace().unwrap_or_default(),
            action = %event.action(),
        );

        let outcome = AssertUnwindSafe(self.dispatch(event).instrument(span))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(DispatchError::Panicked(panic_message(panic.as_ref()))));

        let control = match outcome {
            Ok(control) => control,
            Err(e) => {
                error!("Error during event processing {}: {}", description, e);
                metrics::increment_dispatch_errors();
                DispatchControl::ErrorDuringDispatch
            }
        };

        metrics::increment_dispatches(control.outcome());
        metrics::observe_dispatch_duration(start.elapsed().as_secs_f64());
        control
    }

    async fn dispatch(&self, event: CustomResourceEvent<K>) -> Result<DispatchControl, DispatchError> {
        let key = resource_key(event.resource());
        info!(
            "Handling {} event for resource {} (generation {:?})",
            event.action(),
            key,
            event.resource().meta().generation
        );

        if event.action() == ResourceAction::Error {
            error!("Received error for resource: {}", key);
            return Ok(DispatchControl::Default);
        }

        let marked_for_deletion = is_marked_for_deletion(event.resource());
        let has_our_finalizer = has_finalizer(event.resource(), &self.finalizer);

        if marked_for_deletion && !has_our_finalizer {
            debug!(
                "Skipping event dispatching for {} since it's marked for deletion but has no {} finalizer",
                key, self.finalizer
            );
            return Ok(DispatchControl::Default);
        }

        let context = Context::new(RetryInfo::new(event.retry_count(), event.is_last_attempt()));
        let force = event.process_regardless_of_generation();
        let resource = event.into_resource();

        if marked_for_deletion {
            self.handle_delete(resource, &context).await
        } else if !has_our_finalizer {
            self.attach_finalizer(resource).await
        } else {
            self.handle_upsert(resource, force, &context).await
        }
    }

    async fn attach_finalizer(&self, mut resource: K) -> Result<DispatchControl, DispatchError> {
        debug!(
            "Adding finalizer {} to resource {} version {:?}",
            self.finalizer,
            resource_key(&resource),
            resource.resource_version()
        );
        add_finalizer(&mut resource, &self.finalizer);
        self.replace(&resource).await?;
        metrics::increment_finalizers_added();
        info!(
            "✅ Finalizer {} attached to {}",
            self.finalizer,
            resource_key(&resource)
        );
        Ok(DispatchControl::Default)
    }

    async fn handle_upsert(
        &self,
        resource: K,
        force: bool,
        context: &Context,
    ) -> Result<DispatchControl, DispatchError> {
        let key = resource_key(&resource);
        let uid = resource.uid();
        let generation = resource.meta().generation;

        if !self.should_process(&key, uid.as_deref(), generation, force)? {
            debug!(
                "Skipping upsert of {} since generation {:?} was already processed",
                key, generation
            );
            metrics::increment_generation_skips();
            return Ok(DispatchControl::Default);
        }

        let control = self
            .reconciler
            .upsert(resource, context)
            .await
            .map_err(|source| DispatchError::Reconciler {
                hook: "upsert",
                source,
            })?;
        let reprocess = DispatchControl::from_reprocess(&control);

        match control.into_action() {
            UpdateAction::UpdateStatus(updated) => {
                debug!("Updating status of {}", key);
                self.facade.update_status(&updated).await?;
            }
            UpdateAction::UpdateResource(updated) => {
                debug!("Updating resource {}", key);
                self.replace(&updated).await?;
            }
            UpdateAction::NoUpdate => {
                debug!("No update requested for {}", key);
            }
        }

        if let (true, Some(uid), Some(generation)) = (self.generation_aware, uid, generation) {
            self.generations.mark_processed(&uid, generation);
        }

        log_reprocess(&key, reprocess);
        Ok(reprocess)
    }

    /// `!generation_aware || generation > cached || force`
    fn should_process(
        &self,
        key: &str,
        uid: Option<&str>,
        generation: Option<i64>,
        force: bool,
    ) -> Result<bool, DispatchError> {
        if !self.generation_aware || force {
            return Ok(true);
        }
        let uid = uid.ok_or_else(|| DispatchError::MissingMetadata {
            resource: key.to_owned(),
            field: "uid",
        })?;
        Ok(match generation {
            Some(generation) => self.generations.is_newer(uid, generation),
            None => true,
        })
    }

    async fn handle_delete(
        &self,
        resource: K,
        context: &Context,
    ) -> Result<DispatchControl, DispatchError> {
        let key = resource_key(&resource);
        let uid = resource.uid();
        let has_our_finalizer = has_finalizer(&resource, &self.finalizer);
        let mut released = resource.clone();

        let control = self
            .reconciler
            .delete(resource, context)
            .await
            .map_err(|source| DispatchError::Reconciler {
                hook: "delete",
                source,
            })?;

        if control.is_remove_finalizer() && has_our_finalizer {
            remove_finalizer(&mut released, &self.finalizer);
            self.replace(&released).await?;
            if let Some(uid) = uid {
                self.generations.purge(&uid);
            }
            metrics::increment_finalizers_removed();
            info!("🗑️  Finalizer {} removed from {}", self.finalizer, key);
        } else {
            debug!(
                "Skipping finalizer remove for {}. removeFinalizer: {}, hasFinalizer: {}",
                key,
                control.is_remove_finalizer(),
                has_our_finalizer
            );
        }

        let reprocess = DispatchControl::from_reprocess(&control);
        log_reprocess(&key, reprocess);
        Ok(reprocess)
    }

    async fn replace(&self, resource: &K) -> Result<K, DispatchError> {
        debug!(
            "Trying to replace resource {}, version: {:?}",
            resource_key(resource),
            resource.resource_version()
        );
        trace!("Resource before update: {:?}", resource);
        Ok(self.facade.replace_with_lock(resource).await?)
    }
}

fn log_reprocess(key: &str, control: DispatchControl) {
    if let Some(delay) = control.reprocess_delay() {
        info!(
            "📅 Reprocessing {} scheduled in {}s (at {})",
            key,
            delay.as_secs(),
            next_run(delay)
        );
    }
}

fn next_run(delay: Duration) -> String {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|delay| chrono::Utc::now().checked_add_signed(delay))
        .map_or_else(|| "unknown".to_string(), |at| at.to_rfc3339())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
