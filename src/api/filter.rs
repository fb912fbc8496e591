//! # Event Filters
//!
//! Stateless predicates evaluated against a resource or a change to it.
//! Filters are instantiated from the [`crate::registry`] when a declaration
//! references them, then evaluated by the event source feeding the dispatcher.

use crate::api::resource::is_marked_for_deletion;
use kube::Resource;
use std::fmt::Debug;
use std::sync::Arc;

/// Decides whether a change to a resource should reach the dispatcher
///
/// `old` is `None` for resources seen for the first time.
pub trait ResourceEventFilter<K>: Debug + Send + Sync {
    fn accept_change(&self, old: Option<&K>, new: &K) -> bool;
}

/// Filters add notifications
pub trait OnAddFilter<K>: Debug + Send + Sync {
    fn accept(&self, resource: &K) -> bool;
}

/// Filters update notifications
pub trait OnUpdateFilter<K>: Debug + Send + Sync {
    fn accept(&self, new: &K, old: &K) -> bool;
}

/// Filters delete notifications
///
/// `final_state_unknown` is set when the watch missed the actual deletion and
/// only the last known state is available.
pub trait OnDeleteFilter<K>: Debug + Send + Sync {
    fn accept(&self, resource: &K, final_state_unknown: bool) -> bool;
}

/// Filters every notification regardless of its kind
pub trait GenericFilter<K>: Debug + Send + Sync {
    fn accept(&self, resource: &K) -> bool;
}

/// Accepts every change
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl<K> ResourceEventFilter<K> for Passthrough {
    fn accept_change(&self, _old: Option<&K>, _new: &K) -> bool {
        true
    }
}

/// Rejects every change
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl<K> ResourceEventFilter<K> for RejectAll {
    fn accept_change(&self, _old: Option<&K>, _new: &K) -> bool {
        false
    }
}

/// Accepts changes to resources that are marked for deletion
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkedForDeletion;

impl<K: Resource> ResourceEventFilter<K> for MarkedForDeletion {
    fn accept_change(&self, _old: Option<&K>, new: &K) -> bool {
        is_marked_for_deletion(new)
    }
}

/// Accepts first sightings and changes that bumped the generation
///
/// Resources without a generation are always accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationChanged;

impl<K: Resource> ResourceEventFilter<K> for GenerationChanged {
    fn accept_change(&self, old: Option<&K>, new: &K) -> bool {
        match (old.and_then(|o| o.meta().generation), new.meta().generation) {
            (Some(old_gen), Some(new_gen)) => new_gen != old_gen,
            _ => true,
        }
    }
}

/// Logical AND over filters, evaluated left to right with short-circuit
///
/// An empty conjunction accepts everything.
#[derive(Debug)]
pub struct AndFilter<K> {
    filters: Vec<Arc<dyn ResourceEventFilter<K>>>,
}

impl<K> AndFilter<K> {
    pub fn new(filters: Vec<Arc<dyn ResourceEventFilter<K>>>) -> Self {
        Self { filters }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl<K: Debug> ResourceEventFilter<K> for AndFilter<K> {
    fn accept_change(&self, old: Option<&K>, new: &K) -> bool {
        self.filters.iter().all(|f| f.accept_change(old, new))
    }
}

/// Logical OR over filters; an empty disjunction rejects everything
#[derive(Debug)]
pub struct OrFilter<K> {
    filters: Vec<Arc<dyn ResourceEventFilter<K>>>,
}

impl<K> OrFilter<K> {
    pub fn new(filters: Vec<Arc<dyn ResourceEventFilter<K>>>) -> Self {
        Self { filters }
    }
}

impl<K: Debug> ResourceEventFilter<K> for OrFilter<K> {
    fn accept_change(&self, old: Option<&K>, new: &K) -> bool {
        self.filters.iter().any(|f| f.accept_change(old, new))
    }
}

/// Negation of a filter
#[derive(Debug)]
pub struct NotFilter<K> {
    inner: Arc<dyn ResourceEventFilter<K>>,
}

impl<K> NotFilter<K> {
    pub fn new(inner: Arc<dyn ResourceEventFilter<K>>) -> Self {
        Self { inner }
    }
}

impl<K: Debug> ResourceEventFilter<K> for NotFilter<K> {
    fn accept_change(&self, old: Option<&K>, new: &K) -> bool {
        !self.inner.accept_change(old, new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ConfigMap;
    use kube::api::ObjectMeta;

    fn with_generation(generation: Option<i64>) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some("cm".to_string()),
                generation,
                ..ObjectMeta::default()
            },
            ..ConfigMap::default()
        }
    }

    #[test]
    fn test_generation_changed() {
        let filter = GenerationChanged;
        let v1 = with_generation(Some(1));
        let v2 = with_generation(Some(2));
        assert!(filter.accept_change(None, &v1));
        assert!(!filter.accept_change(Some(&v1), &v1));
        assert!(filter.accept_change(Some(&v1), &v2));
        assert!(filter.accept_change(Some(&v1), &with_generation(None)));
    }

    #[test]
    fn test_and_filter_short_circuits_in_order() {
        let cm = with_generation(Some(1));
        let filters: Vec<Arc<dyn ResourceEventFilter<ConfigMap>>> =
            vec![Arc::new(Passthrough), Arc::new(RejectAll)];
        let and = AndFilter::new(filters);
        assert_eq!(and.len(), 2);
        assert!(!and.accept_change(None, &cm));
        assert!(AndFilter::<ConfigMap>::new(vec![]).accept_change(None, &cm));
    }

    #[test]
    fn test_or_and_not() {
        let cm = with_generation(Some(1));
        let filters: Vec<Arc<dyn ResourceEventFilter<ConfigMap>>> =
            vec![Arc::new(RejectAll), Arc::new(Passthrough)];
        let or = OrFilter::new(filters);
        assert!(or.accept_change(None, &cm));
        let not: NotFilter<ConfigMap> = NotFilter::new(Arc::new(Passthrough));
        assert!(!not.accept_change(None, &cm));
    }

    #[test]
    fn test_marked_for_deletion_rejects_live_resources() {
        assert!(!MarkedForDeletion.accept_change(None, &with_generation(Some(1))));
    }
}
