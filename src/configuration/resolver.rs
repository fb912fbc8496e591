//! # Configuration Resolver
//!
//! Resolves a [`ControllerDeclaration`] against an [`ArtifactRegistry`] into
//! a [`ControllerConfiguration`].
//!
//! Defaults applied when a declaration leaves a value unset:
//!
//! | accessor | default |
//! |----------|---------|
//! | `name` | the reconciler's name |
//! | `finalizer_name` | `<plural>.<group>/finalizer` of the managed type |
//! | `is_generation_aware` | `true` |
//! | `namespaces` | all namespaces |
//! | `label_selector` | empty |
//! | `event_filter` | passthrough |
//! | `max_reconciliation_interval` | none |
//! | `rate_limiter` | `linear` |
//! | `retry` | `generic` |
//!
//! Accessors are pure functions of the declaration; the expensive ones are
//! memoized by [`ConfigurationResolver::resolve`] and
//! [`ConfigurationResolver::dependent_resources`].

use crate::api::filter::{
    AndFilter, GenericFilter, OnAddFilter, OnUpdateFilter, Passthrough, ResourceEventFilter,
};
use crate::api::reconciler::Reconciler;
use crate::api::resource::default_finalizer_name;
use crate::configuration::declaration::{ControllerDeclaration, DeclarationSet};
use crate::configuration::dependent::{build_dependent_specs, DependentResourceSpec};
use crate::configuration::error::ConfigurationError;
use crate::configuration::instantiate::Instantiator;
use crate::configuration::validation::validate_finalizer_name;
use crate::constants::{DEFAULT_RATE_LIMITER, DEFAULT_RETRY};
use crate::policy::rate_limit::RateLimiter;
use crate::policy::retry::Retry;
use crate::registry::ArtifactRegistry;
use kube::Resource;
use std::collections::BTreeSet;
use std::fmt::{self, Debug};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info};

const CONTROLLER_ORIGIN: &str = "controller declaration";

/// Namespaces a controller watches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Namespaces {
    All,
    Explicit(BTreeSet<String>),
}

impl Namespaces {
    /// An empty or blank-only declaration means all namespaces
    #[must_use]
    pub fn from_declared(namespaces: &[String]) -> Self {
        let set: BTreeSet<String> = namespaces
            .iter()
            .map(|ns| ns.trim())
            .filter(|ns| !ns.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        if set.is_empty() {
            Namespaces::All
        } else {
            Namespaces::Explicit(set)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Namespaces::All)
    }

    /// Whether a resource in `namespace` is in scope
    ///
    /// Cluster-scoped resources (`None`) are only in scope when watching all
    /// namespaces.
    pub fn contains(&self, namespace: Option<&str>) -> bool {
        match (self, namespace) {
            (Namespaces::All, _) => true,
            (Namespaces::Explicit(set), Some(ns)) => set.contains(ns),
            (Namespaces::Explicit(_), None) => false,
        }
    }
}

/// Resolved, immutable configuration of one controller
pub struct ControllerConfiguration<K> {
    name: String,
    finalizer_name: String,
    generation_aware: bool,
    namespaces: Namespaces,
    label_selector: String,
    event_filter: Arc<dyn ResourceEventFilter<K>>,
    max_reconciliation_interval: Option<Duration>,
    rate_limiter: Arc<dyn RateLimiter>,
    retry: Arc<dyn Retry>,
    on_add_filter: Option<Arc<dyn OnAddFilter<K>>>,
    on_update_filter: Option<Arc<dyn OnUpdateFilter<K>>>,
    generic_filter: Option<Arc<dyn GenericFilter<K>>>,
    dependent_resources: Arc<[DependentResourceSpec<K>]>,
}

impl<K> Debug for ControllerConfiguration<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerConfiguration")
            .field("name", &self.name)
            .field("finalizer_name", &self.finalizer_name)
            .field("generation_aware", &self.generation_aware)
            .field("namespaces", &self.namespaces)
            .field("label_selector", &self.label_selector)
            .field("event_filter", &self.event_filter)
            .field("max_reconciliation_interval", &self.max_reconciliation_interval)
            .field("rate_limiter", &self.rate_limiter)
            .field("retry", &self.retry)
            .field(
                "dependent_resources",
                &self
                    .dependent_resources
                    .iter()
                    .map(DependentResourceSpec::name)
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl<K> ControllerConfiguration<K> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn finalizer_name(&self) -> &str {
        &self.finalizer_name
    }

    pub fn is_generation_aware(&self) -> bool {
        self.generation_aware
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    pub fn label_selector(&self) -> &str {
        &self.label_selector
    }

    pub fn event_filter(&self) -> &Arc<dyn ResourceEventFilter<K>> {
        &self.event_filter
    }

    pub fn max_reconciliation_interval(&self) -> Option<Duration> {
        self.max_reconciliation_interval
    }

    pub fn rate_limiter(&self) -> &Arc<dyn RateLimiter> {
        &self.rate_limiter
    }

    pub fn retry(&self) -> &Arc<dyn Retry> {
        &self.retry
    }

    pub fn on_add_filter(&self) -> Option<&Arc<dyn OnAddFilter<K>>> {
        self.on_add_filter.as_ref()
    }

    pub fn on_update_filter(&self) -> Option<&Arc<dyn OnUpdateFilter<K>>> {
        self.on_update_filter.as_ref()
    }

    pub fn generic_filter(&self) -> Option<&Arc<dyn GenericFilter<K>>> {
        self.generic_filter.as_ref()
    }

    pub fn dependent_resources(&self) -> &[DependentResourceSpec<K>] {
        &self.dependent_resources
    }
}

/// Resolves one reconciler's declaration
pub struct ConfigurationResolver<K> {
    reconciler_name: String,
    declaration: ControllerDeclaration,
    registry: Arc<ArtifactRegistry<K>>,
    dependents: OnceLock<Arc<[DependentResourceSpec<K>]>>,
    resolved: OnceLock<Arc<ControllerConfiguration<K>>>,
}

impl<K> Debug for ConfigurationResolver<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationResolver")
            .field("reconciler_name", &self.reconciler_name)
            .field("declaration", &self.declaration)
            .field("resolved", &self.resolved.get().is_some())
            .finish_non_exhaustive()
    }
}

impl<K> ConfigurationResolver<K>
where
    K: Resource + Debug + Send + Sync + 'static,
    K::DynamicType: Default,
{
    /// Fails when `declaration` is `None`: every reconciler must be declared
    pub fn new(
        reconciler_name: impl Into<String>,
        declaration: Option<ControllerDeclaration>,
        registry: Arc<ArtifactRegistry<K>>,
    ) -> Result<Self, ConfigurationError> {
        let reconciler_name = reconciler_name.into();
        let declaration = declaration.ok_or_else(|| ConfigurationError::MissingDeclaration {
            reconciler: reconciler_name.clone(),
        })?;
        Ok(Self {
            reconciler_name,
            declaration,
            registry,
            dependents: OnceLock::new(),
            resolved: OnceLock::new(),
        })
    }

    /// Looks the reconciler's declaration up by [`Reconciler::name`]
    pub fn for_reconciler<R>(
        reconciler: &R,
        declarations: &DeclarationSet,
        registry: Arc<ArtifactRegistry<K>>,
    ) -> Result<Self, ConfigurationError>
    where
        R: Reconciler<K> + ?Sized,
    {
        let reconciler_name = reconciler.name();
        let declaration = declarations.get(&reconciler_name).cloned();
        Self::new(reconciler_name, declaration, registry)
    }

    pub fn declaration(&self) -> &ControllerDeclaration {
        &self.declaration
    }

    fn instantiator(&self) -> Instantiator<'_, K> {
        Instantiator {
            reconciler: &self.reconciler_name,
            registry: &self.registry,
            configs: &self.declaration.configs,
        }
    }

    pub fn name(&self) -> String {
        self.declaration
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.reconciler_name)
            .to_owned()
    }

    /// The declared finalizer, validated, or the managed type's default
    pub fn finalizer_name(&self) -> Result<String, ConfigurationError> {
        match self
            .declaration
            .finalizer_name
            .as_deref()
            .filter(|f| !f.trim().is_empty())
        {
            Some(finalizer) => {
                validate_finalizer_name(finalizer).map_err(|e| {
                    ConfigurationError::InvalidFinalizer {
                        reconciler: self.reconciler_name.clone(),
                        finalizer: finalizer.to_owned(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(finalizer.to_owned())
            }
            None => Ok(default_finalizer_name::<K>()),
        }
    }

    pub fn is_generation_aware(&self) -> bool {
        self.declaration.generation_aware.unwrap_or(true)
    }

    pub fn namespaces(&self) -> Namespaces {
        Namespaces::from_declared(&self.declaration.namespaces)
    }

    pub fn label_selector(&self) -> String {
        self.declaration.label_selector.clone().unwrap_or_default()
    }

    /// Declared event filters AND-combined in declaration order
    pub fn event_filter(&self) -> Result<Arc<dyn ResourceEventFilter<K>>, ConfigurationError> {
        let instantiator = self.instantiator();
        let mut filters: Vec<Arc<dyn ResourceEventFilter<K>>> =
            Vec::with_capacity(self.declaration.event_filters.len());
        for id in &self.declaration.event_filters {
            if let Some(filter) =
                instantiator.filter(&self.registry.filters.event, Some(id), CONTROLLER_ORIGIN)?
            {
                filters.push(filter);
            }
        }

        let filter: Arc<dyn ResourceEventFilter<K>> = match filters.len() {
            0 => Arc::new(Passthrough),
            1 => filters.remove(0),
            _ => Arc::new(AndFilter::new(filters)),
        };
        Ok(filter)
    }

    pub fn max_reconciliation_interval(&self) -> Result<Option<Duration>, ConfigurationError> {
        match &self.declaration.max_reconciliation_interval {
            Some(interval) => {
                interval
                    .resolve()
                    .map_err(|e| ConfigurationError::InvalidInterval {
                        reconciler: self.reconciler_name.clone(),
                        reason: e.to_string(),
                    })
            }
            None => Ok(None),
        }
    }

    pub fn rate_limiter(&self) -> Result<Arc<dyn RateLimiter>, ConfigurationError> {
        let id = self
            .declaration
            .rate_limiter
            .as_deref()
            .unwrap_or(DEFAULT_RATE_LIMITER);
        self.instantiator()
            .instantiate(&self.registry.rate_limiters, id)
    }

    pub fn retry(&self) -> Result<Arc<dyn Retry>, ConfigurationError> {
        let id = self.declaration.retry.as_deref().unwrap_or(DEFAULT_RETRY);
        self.instantiator().instantiate(&self.registry.retries, id)
    }

    pub fn on_add_filter(&self) -> Result<Option<Arc<dyn OnAddFilter<K>>>, ConfigurationError> {
        self.instantiator().filter(
            &self.registry.filters.on_add,
            self.declaration.on_add_filter.as_deref(),
            CONTROLLER_ORIGIN,
        )
    }

    pub fn on_update_filter(
        &self,
    ) -> Result<Option<Arc<dyn OnUpdateFilter<K>>>, ConfigurationError> {
        self.instantiator().filter(
            &self.registry.filters.on_update,
            self.declaration.on_update_filter.as_deref(),
            CONTROLLER_ORIGIN,
        )
    }

    pub fn generic_filter(&self) -> Result<Option<Arc<dyn GenericFilter<K>>>, ConfigurationError> {
        self.instantiator().filter(
            &self.registry.filters.generic,
            self.declaration.generic_filter.as_deref(),
            CONTROLLER_ORIGIN,
        )
    }

    /// The dependent resource graph, built once and shared afterwards
    pub fn dependent_resources(
        &self,
    ) -> Result<Arc<[DependentResourceSpec<K>]>, ConfigurationError> {
        if let Some(specs) = self.dependents.get() {
            return Ok(Arc::clone(specs));
        }
        let specs: Arc<[DependentResourceSpec<K>]> = build_dependent_specs(
            &self.instantiator(),
            &self.declaration.dependents,
            &self.namespaces(),
        )?
        .into();
        Ok(Arc::clone(self.dependents.get_or_init(|| specs)))
    }

    /// Resolves every accessor into a [`ControllerConfiguration`]
    ///
    /// The first successful resolution is cached; later calls return it.
    pub fn resolve(&self) -> Result<Arc<ControllerConfiguration<K>>, ConfigurationError> {
        if let Some(configuration) = self.resolved.get() {
            return Ok(Arc::clone(configuration));
        }

        let configuration = ControllerConfiguration {
            name: self.name(),
            finalizer_name: self.finalizer_name()?,
            generation_aware: self.is_generation_aware(),
            namespaces: self.namespaces(),
            label_selector: self.label_selector(),
            event_filter: self.event_filter()?,
            max_reconciliation_interval: self.max_reconciliation_interval()?,
            rate_limiter: self.rate_limiter()?,
            retry: self.retry()?,
            on_add_filter: self.on_add_filter()?,
            on_update_filter: self.on_update_filter()?,
            generic_filter: self.generic_filter()?,
            dependent_resources: self.dependent_resources()?,
        };

        info!(
            "Resolved configuration for controller '{}' (finalizer: {}, generation aware: {}, dependents: {})",
            configuration.name,
            configuration.finalizer_name,
            configuration.generation_aware,
            configuration.dependent_resources.len()
        );
        debug!("Controller configuration: {:?}", configuration);

        Ok(Arc::clone(
            self.resolved.get_or_init(|| Arc::new(configuration)),
        ))
    }
}
