//! # Controller
//!
//! Binds a [`Reconciler`] to its resolved configuration and a dispatcher.
//! Registration resolves the whole configuration up front, so a bad
//! declaration stops the operator before any event is dispatched.
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use operator_core::prelude::*;
//! # use k8s_openapi::api::core::v1::ConfigMap;
//! # async fn run(reconciler: Arc<dyn Reconciler<ConfigMap>>, client: kube::Client) -> anyhow::Result<()> {
//! let declarations = DeclarationSet::from_file("controllers.yaml")?;
//! let _controller = Controller::register_from_set(
//!     reconciler,
//!     &declarations,
//!     Arc::new(ArtifactRegistry::with_builtins()),
//!     Arc::new(KubeResourceFacade::<ConfigMap>::new(client)),
//! )?;
//! # Ok(())
//! # }
//! ```

use crate::api::reconciler::Reconciler;
use crate::configuration::{
    ConfigurationError, ConfigurationResolver, ControllerConfiguration, ControllerDeclaration,
    DeclarationSet,
};
use crate::dispatch::{CustomResourceEvent, DispatchControl, EventDispatcher, ResourceFacade};
use crate::policy::RetryExecution;
use crate::registry::ArtifactRegistry;
use kube::{Resource, ResourceExt};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Controller<K>
where
    K: Send + 'static,
{
    configuration: Arc<ControllerConfiguration<K>>,
    dispatcher: EventDispatcher<K>,
}

impl<K> Controller<K>
where
    K: Resource + Clone + Debug + Send + Sync + 'static,
    K::DynamicType: Default,
{
    /// Resolves `declaration` and builds the dispatcher
    ///
    /// Fails on any configuration error, including a missing declaration.
    pub fn register(
        reconciler: Arc<dyn Reconciler<K>>,
        declaration: Option<ControllerDeclaration>,
        registry: Arc<ArtifactRegistry<K>>,
        facade: Arc<dyn ResourceFacade<K>>,
    ) -> Result<Self, ConfigurationError> {
        let resolver = ConfigurationResolver::new(reconciler.name(), declaration, registry)?;
        Self::from_resolver(reconciler, &resolver, facade)
    }

    /// Like [`Controller::register`], looking the declaration up by
    /// reconciler name
    pub fn register_from_set(
        reconciler: Arc<dyn Reconciler<K>>,
        declarations: &DeclarationSet,
        registry: Arc<ArtifactRegistry<K>>,
        facade: Arc<dyn ResourceFacade<K>>,
    ) -> Result<Self, ConfigurationError> {
        let resolver = ConfigurationResolver::for_reconciler(reconciler.as_ref(), declarations, registry)?;
        Self::from_resolver(reconciler, &resolver, facade)
    }

    fn from_resolver(
        reconciler: Arc<dyn Reconciler<K>>,
        resolver: &ConfigurationResolver<K>,
        facade: Arc<dyn ResourceFacade<K>>,
    ) -> Result<Self, ConfigurationError> {
        let configuration = resolver.resolve()?;
        let dispatcher = EventDispatcher::from_configuration(reconciler, facade, &configuration);
        info!(
            "Registered controller '{}' with finalizer {}",
            configuration.name(),
            configuration.finalizer_name()
        );
        Ok(Self {
            configuration,
            dispatcher,
        })
    }

    pub fn name(&self) -> &str {
        self.configuration.name()
    }

    pub fn configuration(&self) -> &Arc<ControllerConfiguration<K>> {
        &self.configuration
    }

    pub fn dispatcher(&self) -> &EventDispatcher<K> {
        &self.dispatcher
    }

    /// Whether a change should be dispatched: the resource must be in a
    /// watched namespace and pass the composed event filter
    pub fn accepts_change(&self, old: Option<&K>, new: &K) -> bool {
        self.configuration
            .namespaces()
            .contains(new.namespace().as_deref())
            && self.configuration.event_filter().accept_change(old, new)
    }

    /// A fresh retry execution for a resource whose dispatch failed
    pub fn new_retry_execution(&self) -> Box<dyn RetryExecution> {
        self.configuration.retry().init_execution()
    }

    pub async fn handle_event(&self, event: CustomResourceEvent<K>) -> DispatchControl {
        self.dispatcher.handle_event(event).await
    }
}
