//! Registry lookups with the error context the resolver reports.

use crate::api::condition::{Condition, ConditionKind};
use crate::configuration::error::ConfigurationError;
use crate::registry::{ArtifactRegistry, ConfigBlocks, Registry};
use std::sync::Arc;

/// Instantiates artifacts for one reconciler
pub(crate) struct Instantiator<'a, K> {
    pub(crate) reconciler: &'a str,
    pub(crate) registry: &'a ArtifactRegistry<K>,
    pub(crate) configs: &'a ConfigBlocks,
}

impl<K: 'static> Instantiator<'_, K> {
    /// Instantiates a mandatory artifact such as a rate limiter or retry
    pub(crate) fn instantiate<T: ?Sized + 'static>(
        &self,
        registry: &Registry<T>,
        target: &str,
    ) -> Result<Arc<T>, ConfigurationError> {
        registry
            .instantiate(target, self.configs)
            .map_err(|failure| ConfigurationError::Instantiation {
                reconciler: self.reconciler.to_owned(),
                kind: registry.kind(),
                target: target.to_owned(),
                reason: failure.to_string(),
            })
    }

    /// Instantiates an optional filter; `None` stays absent
    pub(crate) fn filter<T: ?Sized + 'static>(
        &self,
        registry: &Registry<T>,
        target: Option<&str>,
        origin: &str,
    ) -> Result<Option<Arc<T>>, ConfigurationError> {
        let Some(target) = target else {
            return Ok(None);
        };
        registry
            .instantiate(target, self.configs)
            .map(Some)
            .map_err(|failure| ConfigurationError::FilterCreation {
                reconciler: self.reconciler.to_owned(),
                kind: registry.kind(),
                target: target.to_owned(),
                origin: origin.to_owned(),
                reason: failure.to_string(),
            })
    }

    /// Instantiates an optional gating condition; `None` stays absent
    pub(crate) fn condition(
        &self,
        kind: ConditionKind,
        target: Option<&str>,
    ) -> Result<Option<Arc<dyn Condition<K>>>, ConfigurationError> {
        target
            .map(|target| {
                self.registry
                    .conditions
                    .instantiate(target, self.configs)
                    .map_err(|failure| ConfigurationError::Instantiation {
                        reconciler: self.reconciler.to_owned(),
                        kind: self.registry.conditions.kind(),
                        target: target.to_owned(),
                        reason: format!("{kind}: {failure}"),
                    })
            })
            .transpose()
    }
}
