//! # Artifact Registry
//!
//! Controller declarations name filters, conditions, rate limiters, retries
//! and dependent resource types by identifier. The registry maps each
//! identifier to a constructor so the resolver can turn a declaration into
//! live objects.
//!
//! Three registration forms exist:
//!
//! - [`Registry::register`] for types constructible through [`Default`]
//! - [`Registry::register_with`] for a fallible constructor closure
//! - [`Registry::register_configurable`] for types that also read a
//!   structured [`ConfigBlock`] from the declaration's `configs` map
//!
//! ```rust
//! use operator_core::policy::{GenericRetry, GradualRetry, Retry};
//! use operator_core::registry::{ArtifactKind, Registry};
//!
//! let mut retries: Registry<dyn Retry> = Registry::new(ArtifactKind::Retry);
//! retries.register_configurable::<GenericRetry, GradualRetry>("generic");
//! assert!(retries.contains("generic"));
//! ```

pub mod dependent;

pub use dependent::{DependentFamily, DependentTypeRegistry, KubernetesDependentDeclaration};

use crate::api::condition::Condition;
use crate::api::filter::{
    GenerationChanged, GenericFilter, MarkedForDeletion, OnAddFilter, OnDeleteFilter,
    OnUpdateFilter, Passthrough, RejectAll, ResourceEventFilter,
};
use crate::config::OperatorConfig;
use crate::constants::{DEFAULT_RATE_LIMITER, DEFAULT_RETRY};
use crate::policy::backoff::{FibonacciBackoffConfig, FibonacciRetry};
use crate::policy::rate_limit::{LinearRateLimiter, RateLimited, RateLimiter};
use crate::policy::retry::{GenericRetry, GradualRetry, Retry};
use kube::api::DynamicObject;
use kube::Resource;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Named structured configuration blocks attached to a declaration
pub type ConfigBlocks = BTreeMap<String, serde_json::Value>;

type Factory<T> = Box<dyn Fn(&ConfigBlocks) -> Result<Arc<T>, String> + Send + Sync>;

/// A structured configuration block, looked up by `KEY` in [`ConfigBlocks`]
pub trait ConfigBlock: DeserializeOwned + 'static {
    const KEY: &'static str;
}

/// Implemented by artifacts that can be initialized from a [`ConfigBlock`]
pub trait Configurable<C: ConfigBlock> {
    fn init_from(&mut self, config: C);
}

/// Coerces a concrete artifact into the shared trait object a registry holds
pub trait IntoArtifact<T: ?Sized> {
    fn into_artifact(self) -> Arc<T>;
}

impl<F: RateLimiter + 'static> IntoArtifact<dyn RateLimiter> for F {
    fn into_artifact(self) -> Arc<dyn RateLimiter> {
        Arc::new(self)
    }
}

impl<F: Retry + 'static> IntoArtifact<dyn Retry> for F {
    fn into_artifact(self) -> Arc<dyn Retry> {
        Arc::new(self)
    }
}

impl<K, F: ResourceEventFilter<K> + 'static> IntoArtifact<dyn ResourceEventFilter<K>> for F {
    fn into_artifact(self) -> Arc<dyn ResourceEventFilter<K>> {
        Arc::new(self)
    }
}

impl<K, F: OnAddFilter<K> + 'static> IntoArtifact<dyn OnAddFilter<K>> for F {
    fn into_artifact(self) -> Arc<dyn OnAddFilter<K>> {
        Arc::new(self)
    }
}

impl<K, F: OnUpdateFilter<K> + 'static> IntoArtifact<dyn OnUpdateFilter<K>> for F {
    fn into_artifact(self) -> Arc<dyn OnUpdateFilter<K>> {
        Arc::new(self)
    }
}

impl<K, F: OnDeleteFilter<K> + 'static> IntoArtifact<dyn OnDeleteFilter<K>> for F {
    fn into_artifact(self) -> Arc<dyn OnDeleteFilter<K>> {
        Arc::new(self)
    }
}

impl<K, F: GenericFilter<K> + 'static> IntoArtifact<dyn GenericFilter<K>> for F {
    fn into_artifact(self) -> Arc<dyn GenericFilter<K>> {
        Arc::new(self)
    }
}

impl<K, F: Condition<K> + 'static> IntoArtifact<dyn Condition<K>> for F {
    fn into_artifact(self) -> Arc<dyn Condition<K>> {
        Arc::new(self)
    }
}

/// What a registry produces; used in error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    EventFilter,
    OnAddFilter,
    OnUpdateFilter,
    OnDeleteFilter,
    GenericFilter,
    Condition,
    RateLimiter,
    Retry,
}

impl ArtifactKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::EventFilter => "ResourceEventFilter",
            ArtifactKind::OnAddFilter => "OnAddFilter",
            ArtifactKind::OnUpdateFilter => "OnUpdateFilter",
            ArtifactKind::OnDeleteFilter => "OnDeleteFilter",
            ArtifactKind::GenericFilter => "GenericFilter",
            ArtifactKind::Condition => "Condition",
            ArtifactKind::RateLimiter => "RateLimiter",
            ArtifactKind::Retry => "Retry",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why [`Registry::instantiate`] could not produce an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstantiationFailure {
    Unregistered,
    ConstructorFailed(String),
}

impl fmt::Display for InstantiationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstantiationFailure::Unregistered => f.write_str("no constructor is registered"),
            InstantiationFailure::ConstructorFailed(reason) => f.write_str(reason),
        }
    }
}

/// Identifier to constructor map for one kind of artifact
pub struct Registry<T: ?Sized> {
    kind: ArtifactKind,
    factories: HashMap<String, Factory<T>>,
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.factories.keys().collect();
        ids.sort();
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("ids", &ids)
            .finish()
    }
}

impl<T: ?Sized + 'static> Registry<T> {
    #[must_use]
    pub fn new(kind: ArtifactKind) -> Self {
        Self {
            kind,
            factories: HashMap::new(),
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Registers a type built through its `Default` implementation
    ///
    /// Re-registering an identifier replaces the previous constructor.
    pub fn register<F>(&mut self, id: impl Into<String>) -> &mut Self
    where
        F: Default + IntoArtifact<T> + 'static,
    {
        let factory: Factory<T> =
            Box::new(|_: &ConfigBlocks| Ok(F::default().into_artifact()));
        self.factories.insert(id.into(), factory);
        self
    }

    /// Registers a fallible constructor closure
    pub fn register_with<C>(&mut self, id: impl Into<String>, constructor: C) -> &mut Self
    where
        C: Fn() -> anyhow::Result<Arc<T>> + Send + Sync + 'static,
    {
        let factory: Factory<T> =
            Box::new(move |_: &ConfigBlocks| constructor().map_err(|e| format!("{e:#}")));
        self.factories.insert(id.into(), factory);
        self
    }

    /// Registers a `Default` type that reads the `C::KEY` block when present
    pub fn register_configurable<F, C>(&mut self, id: impl Into<String>) -> &mut Self
    where
        F: Default + Clone + Configurable<C> + IntoArtifact<T> + Send + Sync + 'static,
        C: ConfigBlock,
    {
        self.register_configurable_from::<F, C>(id, F::default())
    }

    /// Like [`Registry::register_configurable`], starting every instance
    /// from a clone of `seed` instead of `F::default()`
    pub fn register_configurable_from<F, C>(&mut self, id: impl Into<String>, seed: F) -> &mut Self
    where
        F: Clone + Configurable<C> + IntoArtifact<T> + Send + Sync + 'static,
        C: ConfigBlock,
    {
        let factory: Factory<T> =
            Box::new(move |configs: &ConfigBlocks| -> Result<Arc<T>, String> {
                let mut instance = seed.clone();
                if let Some(value) = configs.get(C::KEY) {
                    let block: C = serde_json::from_value(value.clone())
                        .map_err(|e| format!("invalid '{}' configuration: {e}", C::KEY))?;
                    instance.init_from(block);
                }
                Ok(instance.into_artifact())
            });
        self.factories.insert(id.into(), factory);
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered identifiers in sorted order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn instantiate(&self, id: &str, configs: &ConfigBlocks) -> Result<Arc<T>, InstantiationFailure> {
        let factory = self
            .factories
            .get(id)
            .ok_or(InstantiationFailure::Unregistered)?;
        factory(configs).map_err(InstantiationFailure::ConstructorFailed)
    }
}

/// One registry per filter flavour over resource type `R`
#[derive(Debug)]
pub struct FilterRegistries<R> {
    pub event: Registry<dyn ResourceEventFilter<R>>,
    pub on_add: Registry<dyn OnAddFilter<R>>,
    pub on_update: Registry<dyn OnUpdateFilter<R>>,
    pub on_delete: Registry<dyn OnDeleteFilter<R>>,
    pub generic: Registry<dyn GenericFilter<R>>,
}

impl<R: 'static> FilterRegistries<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            event: Registry::new(ArtifactKind::EventFilter),
            on_add: Registry::new(ArtifactKind::OnAddFilter),
            on_update: Registry::new(ArtifactKind::OnUpdateFilter),
            on_delete: Registry::new(ArtifactKind::OnDeleteFilter),
            generic: Registry::new(ArtifactKind::GenericFilter),
        }
    }
}

impl<R: 'static> Default for FilterRegistries<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a resolver may instantiate for a controller over `K`
///
/// Dependent filters operate on [`DynamicObject`] since dependents can be of
/// any kind.
#[derive(Debug)]
pub struct ArtifactRegistry<K> {
    pub filters: FilterRegistries<K>,
    pub dependent_filters: FilterRegistries<DynamicObject>,
    pub conditions: Registry<dyn Condition<K>>,
    pub rate_limiters: Registry<dyn RateLimiter>,
    pub retries: Registry<dyn Retry>,
    pub dependents: DependentTypeRegistry,
}

impl<K: Resource + 'static> ArtifactRegistry<K> {
    /// A registry with nothing registered
    #[must_use]
    pub fn empty() -> Self {
        Self {
            filters: FilterRegistries::new(),
            dependent_filters: FilterRegistries::new(),
            conditions: Registry::new(ArtifactKind::Condition),
            rate_limiters: Registry::new(ArtifactKind::RateLimiter),
            retries: Registry::new(ArtifactKind::Retry),
            dependents: DependentTypeRegistry::new(),
        }
    }

    /// A registry holding the built-in filters and policies
    ///
    /// | kind | identifiers |
    /// |------|-------------|
    /// | event filter | `passthrough`, `reject-all`, `marked-for-deletion`, `generation-changed` |
    /// | rate limiter | `linear` (default), `disabled` |
    /// | retry | `generic` (default), `fibonacci`, `none` |
    #[must_use]
    pub fn with_builtins() -> Self {
        Self::with_policy_seeds(LinearRateLimiter::default(), GenericRetry::default())
    }

    /// Built-ins whose default rate limiter and retry start from the
    /// operator-wide settings
    #[must_use]
    pub fn with_operator_defaults(config: &OperatorConfig) -> Self {
        Self::with_policy_seeds(
            LinearRateLimiter::new(config.rate_limit_refresh_period(), config.rate_limit_per_period),
            GenericRetry::default()
                .with_max_attempts(config.retry_max_attempts)
                .with_initial_interval(config.retry_initial_interval()),
        )
    }

    fn with_policy_seeds(rate_limiter: LinearRateLimiter, retry: GenericRetry) -> Self {
        let mut registry = Self::empty();

        registry
            .filters
            .event
            .register::<Passthrough>("passthrough")
            .register::<RejectAll>("reject-all")
            .register::<MarkedForDeletion>("marked-for-deletion")
            .register::<GenerationChanged>("generation-changed");

        registry
            .rate_limiters
            .register_configurable_from::<LinearRateLimiter, RateLimited>(
                DEFAULT_RATE_LIMITER,
                rate_limiter,
            )
            .register_with("disabled", || Ok(Arc::new(LinearRateLimiter::deactivated())));

        registry
            .retries
            .register_configurable_from::<GenericRetry, GradualRetry>(DEFAULT_RETRY, retry)
            .register_configurable::<FibonacciRetry, FibonacciBackoffConfig>("fibonacci")
            .register_with("none", || Ok(Arc::new(GenericRetry::no_retry())));

        registry
    }
}

impl<K: Resource + 'static> Default for ArtifactRegistry<K> {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ConfigMap;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_builtins_registered() {
        let registry: ArtifactRegistry<ConfigMap> = ArtifactRegistry::with_builtins();
        assert_eq!(
            registry.filters.event.ids(),
            vec!["generation-changed", "marked-for-deletion", "passthrough", "reject-all"]
        );
        assert_eq!(registry.rate_limiters.ids(), vec!["disabled", "linear"]);
        assert_eq!(registry.retries.ids(), vec!["fibonacci", "generic", "none"]);
        assert!(registry.conditions.ids().is_empty());
    }

    #[test]
    fn test_unregistered_identifier() {
        let registry: Registry<dyn Retry> = Registry::new(ArtifactKind::Retry);
        let err = registry
            .instantiate("missing", &ConfigBlocks::new())
            .expect_err("nothing registered");
        assert_eq!(err, InstantiationFailure::Unregistered);
    }

    #[test]
    fn test_configurable_reads_its_block() {
        let registry: ArtifactRegistry<ConfigMap> = ArtifactRegistry::with_builtins();
        let mut configs = ConfigBlocks::new();
        configs.insert(
            "gradualRetry".to_string(),
            json!({ "maxAttempts": 1, "initialIntervalMs": 10 }),
        );
        let retry = registry
            .retries
            .instantiate("generic", &configs)
            .expect("generic retry is built in");
        let mut execution = retry.init_execution();
        assert_eq!(execution.next_delay(), Some(Duration::from_millis(10)));
        assert_eq!(execution.next_delay(), None);
    }

    #[test]
    fn test_invalid_block_reports_key() {
        let registry: ArtifactRegistry<ConfigMap> = ArtifactRegistry::with_builtins();
        let mut configs = ConfigBlocks::new();
        configs.insert("rateLimited".to_string(), json!({ "within": "soon" }));
        match registry.rate_limiters.instantiate("linear", &configs) {
            Err(InstantiationFailure::ConstructorFailed(reason)) => {
                assert!(reason.contains("rateLimited"), "{reason}");
            }
            other => panic!("expected constructor failure, got {other:?}"),
        }
    }

    #[test]
    fn test_register_with_propagates_constructor_error() {
        let mut registry: Registry<dyn RateLimiter> = Registry::new(ArtifactKind::RateLimiter);
        registry.register_with("broken", || Err(anyhow::anyhow!("no quota source")));
        let err = registry
            .instantiate("broken", &ConfigBlocks::new())
            .expect_err("constructor fails");
        assert_eq!(
            err,
            InstantiationFailure::ConstructorFailed("no quota source".to_string())
        );
    }

    #[test]
    fn test_operator_defaults_seed_policies() {
        let config = OperatorConfig {
            retry_max_attempts: 0,
            ..OperatorConfig::default()
        };
        let registry: ArtifactRegistry<ConfigMap> = ArtifactRegistry::with_operator_defaults(&config);
        let retry = registry
            .retries
            .instantiate("generic", &ConfigBlocks::new())
            .expect("generic retry is built in");
        assert!(retry.init_execution().is_last_attempt());
    }
}
