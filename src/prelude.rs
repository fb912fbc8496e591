//! Commonly used types, for glob import.

pub use crate::api::{
    Condition, ConditionKind, Context, DeleteControl, GenericFilter, OnAddFilter, OnDeleteFilter,
    OnUpdateFilter, Reconciler, ResourceEventFilter, RetryInfo, UpdateControl,
};
pub use crate::config::OperatorConfig;
pub use crate::configuration::{
    ConfigurationError, ConfigurationResolver, ControllerConfiguration, ControllerDeclaration,
    DeclarationSet, DependentDeclaration, DependentResourceSpec, Namespaces,
};
pub use crate::controller::Controller;
pub use crate::dispatch::{
    CustomResourceEvent, DispatchControl, EventDispatcher, KubeResourceFacade, ResourceAction,
    ResourceFacade,
};
pub use crate::policy::{RateLimiter, Retry, RetryExecution};
pub use crate::registry::{ArtifactRegistry, KubernetesDependentDeclaration};
