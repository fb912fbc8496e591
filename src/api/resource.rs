//! # Resource Helpers
//!
//! Metadata helpers shared by the dispatcher, the built-in filters and the
//! configuration resolver. Everything here works on any `kube::Resource`.

use crate::constants::FINALIZER_NAME_SUFFIX;
use kube::{Resource, ResourceExt};

/// A resource is marked for deletion once the store has set its deletion timestamp
pub fn is_marked_for_deletion<K: Resource>(resource: &K) -> bool {
    resource.meta().deletion_timestamp.is_some()
}

/// Check whether the resource carries the given finalizer
pub fn has_finalizer<K: Resource>(resource: &K, finalizer: &str) -> bool {
    resource.finalizers().iter().any(|f| f == finalizer)
}

/// Append the finalizer, creating the finalizer list if the resource has none
///
/// Returns `false` when the finalizer was already present.
pub fn add_finalizer<K: Resource>(resource: &mut K, finalizer: &str) -> bool {
    if has_finalizer(resource, finalizer) {
        return false;
    }
    resource.finalizers_mut().push(finalizer.to_string());
    true
}

/// Remove the finalizer from the resource's finalizer list
///
/// Returns `false` when the finalizer was not present.
pub fn remove_finalizer<K: Resource>(resource: &mut K, finalizer: &str) -> bool {
    let finalizers = resource.finalizers_mut();
    match finalizers.iter().position(|f| f == finalizer) {
        Some(pos) => {
            finalizers.remove(pos);
            true
        }
        None => false,
    }
}

/// Default finalizer for a resource type: `<plural>.<group>/finalizer`
///
/// Core-group resources have no group, so the default collapses to
/// `<plural>/finalizer`.
pub fn default_finalizer_name<K>() -> String
where
    K: Resource,
    K::DynamicType: Default,
{
    let dt = K::DynamicType::default();
    let plural = K::plural(&dt);
    let group = K::group(&dt);
    if group.is_empty() {
        format!("{plural}{FINALIZER_NAME_SUFFIX}")
    } else {
        format!("{plural}.{group}{FINALIZER_NAME_SUFFIX}")
    }
}

/// `namespace/name` key used in logs
pub fn resource_key<K: Resource>(resource: &K) -> String {
    match resource.namespace() {
        Some(ns) => format!("{}/{}", ns, resource.name_any()),
        None => resource.name_any(),
    }
}
