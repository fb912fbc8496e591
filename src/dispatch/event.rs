//! # Resource Events
//!
//! A [`CustomResourceEvent`] is one change notification for one resource,
//! plus the retry state the scheduler attaches when redelivering it.

use crate::policy::retry::RetryExecution;
use kube::{Resource, ResourceExt};
use kube_runtime::watcher;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAction {
    Added,
    Modified,
    Deleted,
    Error,
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceAction::Added => "ADDED",
            ResourceAction::Modified => "MODIFIED",
            ResourceAction::Deleted => "DELETED",
            ResourceAction::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone)]
pub struct CustomResourceEvent<K> {
    action: ResourceAction,
    resource: K,
    retry_count: u32,
    last_attempt: bool,
    process_regardless_of_generation: bool,
}

impl<K> CustomResourceEvent<K> {
    pub fn new(action: ResourceAction, resource: K) -> Self {
        Self {
            action,
            resource,
            retry_count: 0,
            last_attempt: false,
            process_regardless_of_generation: false,
        }
    }

    pub fn added(resource: K) -> Self {
        Self::new(ResourceAction::Added, resource)
    }

    pub fn modified(resource: K) -> Self {
        Self::new(ResourceAction::Modified, resource)
    }

    pub fn deleted(resource: K) -> Self {
        Self::new(ResourceAction::Deleted, resource)
    }

    pub fn error(resource: K) -> Self {
        Self::new(ResourceAction::Error, resource)
    }

    /// Converts a watcher event; init markers carry no resource and yield `None`
    pub fn from_watch_event(event: watcher::Event<K>) -> Option<Self> {
        match event {
            watcher::Event::Apply(resource) => Some(Self::modified(resource)),
            watcher::Event::InitApply(resource) => Some(Self::added(resource)),
            watcher::Event::Delete(resource) => Some(Self::deleted(resource)),
            watcher::Event::Init | watcher::Event::InitDone => None,
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry_count: u32, last_attempt: bool) -> Self {
        self.retry_count = retry_count;
        self.last_attempt = last_attempt;
        self
    }

    /// Copies attempt count and last-attempt flag from a retry execution
    #[must_use]
    pub fn with_retry_execution(self, execution: &dyn RetryExecution) -> Self {
        self.with_retry(execution.attempt_count(), execution.is_last_attempt())
    }

    /// Dispatch even if this generation was already processed
    #[must_use]
    pub fn force_reprocess(mut self) -> Self {
        self.process_regardless_of_generation = true;
        self
    }

    pub fn action(&self) -> ResourceAction {
        self.action
    }

    pub fn resource(&self) -> &K {
        &self.resource
    }

    pub fn into_resource(self) -> K {
        self.resource
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn is_last_attempt(&self) -> bool {
        self.last_attempt
    }

    pub fn process_regardless_of_generation(&self) -> bool {
        self.process_regardless_of_generation
    }
}

impl<K> fmt::Display for CustomResourceEvent<K>
where
    K: Resource,
    K::DynamicType: Default,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CustomResourceEvent{{action={}, resource=[name={}, namespace={}, kind={}, uid={}, generation={}, resourceVersion={}], retry={}, lastAttempt={}, force={}}}",
            self.action,
            self.resource.name_any(),
            self.resource.namespace().unwrap_or_default(),
            K::kind(&K::DynamicType::default()),
            self.resource.uid().unwrap_or_default(),
            self.resource
                .meta()
                .generation
                .map_or_else(|| "none".to_string(), |g| g.to_string()),
            self.resource.resource_version().unwrap_or_default(),
            self.retry_count,
            self.last_attempt,
            self.process_regardless_of_generation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::retry::{GenericRetry, Retry};
    use k8s_openapi::api::core::v1::ConfigMap;
    use kube::api::ObjectMeta;

    fn config_map() -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some("settings".to_string()),
                namespace: Some("apps".to_string()),
                generation: Some(2),
                ..ObjectMeta::default()
            },
            ..ConfigMap::default()
        }
    }

    #[test]
    fn test_from_watch_event() {
        let applied = CustomResourceEvent::from_watch_event(watcher::Event::Apply(config_map()))
            .expect("apply carries a resource");
        assert_eq!(applied.action(), ResourceAction::Modified);

        let deleted = CustomResourceEvent::from_watch_event(watcher::Event::Delete(config_map()))
            .expect("delete carries a resource");
        assert_eq!(deleted.action(), ResourceAction::Deleted);

        assert!(CustomResourceEvent::<ConfigMap>::from_watch_event(watcher::Event::InitDone).is_none());
    }

    #[test]
    fn test_retry_metadata_from_execution() {
        let mut execution = GenericRetry::default().with_max_attempts(2).init_execution();
        execution.next_delay();
        execution.next_delay();

        let event = CustomResourceEvent::modified(config_map()).with_retry_execution(execution.as_ref());
        assert_eq!(event.retry_count(), 2);
        assert!(event.is_last_attempt());
        assert!(!event.process_regardless_of_generation());
        assert!(event.force_reprocess().process_regardless_of_generation());
    }

    #[test]
    fn test_display_includes_identity() {
        let text = CustomResourceEvent::modified(config_map()).to_string();
        assert!(text.contains("action=MODIFIED"));
        assert!(text.contains("name=settings"));
        assert!(text.contains("namespace=apps"));
        assert!(text.contains("generation=2"));
    }
}
