//! # Controller Declarations
//!
//! The declarative description of a reconciler: what it manages, how it is
//! scoped, which policies it uses and which dependent resources it owns.
//! Declarations are plain data, written as struct literals or loaded from a
//! YAML file keyed by reconciler name:
//!
//! ```yaml
//! controllers:
//!   widget:
//!     finalizerName: widgets.sample.operator.io/finalizer
//!     namespaces: [apps]
//!     eventFilters: [generation-changed]
//!     maxReconciliationInterval: 10h
//!     retry: generic
//!     configs:
//!       gradualRetry:
//!         maxAttempts: 3
//!     dependents:
//!       - type: deployment
//!       - type: service
//!         dependsOn: [deployment]
//!         readyPostcondition: service-ready
//! ```

use crate::config::OperatorConfig;
use crate::configuration::duration::IntervalDeclaration;
use crate::configuration::error::ConfigurationError;
use crate::registry::ConfigBlocks;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Declarative configuration of one reconciler
///
/// Unset optional fields resolve to the defaults documented on
/// [`crate::configuration::ConfigurationResolver`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ControllerDeclaration {
    /// Overrides the reconciler's own name
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub finalizer_name: Option<String>,
    #[serde(default)]
    pub generation_aware: Option<bool>,
    /// Empty means every namespace
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub label_selector: Option<String>,
    /// Event filter identifiers, AND-combined in order
    #[serde(default)]
    pub event_filters: Vec<String>,
    #[serde(default)]
    pub max_reconciliation_interval: Option<IntervalDeclaration>,
    #[serde(default)]
    pub rate_limiter: Option<String>,
    #[serde(default)]
    pub retry: Option<String>,
    #[serde(default)]
    pub on_add_filter: Option<String>,
    #[serde(default)]
    pub on_update_filter: Option<String>,
    #[serde(default)]
    pub generic_filter: Option<String>,
    #[serde(default)]
    pub dependents: Vec<DependentDeclaration>,
    /// Structured configuration blocks keyed by block name
    #[serde(default)]
    pub configs: ConfigBlocks,
}

impl ControllerDeclaration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_finalizer(mut self, finalizer: impl Into<String>) -> Self {
        self.finalizer_name = Some(finalizer.into());
        self
    }

    #[must_use]
    pub fn with_generation_aware(mut self, generation_aware: bool) -> Self {
        self.generation_aware = Some(generation_aware);
        self
    }

    #[must_use]
    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_event_filter(mut self, id: impl Into<String>) -> Self {
        self.event_filters.push(id.into());
        self
    }

    #[must_use]
    pub fn with_dependent(mut self, dependent: DependentDeclaration) -> Self {
        self.dependents.push(dependent);
        self
    }

    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.configs.insert(key.into(), value);
        self
    }
}

/// One dependent resource owned by a reconciler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DependentDeclaration {
    /// Dependent type identifier, see [`crate::registry::DependentTypeRegistry`]
    #[serde(rename = "type")]
    pub dependent_type: String,
    /// Defaults to the type identifier
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub reconcile_precondition: Option<String>,
    #[serde(default)]
    pub ready_postcondition: Option<String>,
    #[serde(default)]
    pub delete_postcondition: Option<String>,
}

impl DependentDeclaration {
    #[must_use]
    pub fn new(dependent_type: impl Into<String>) -> Self {
        Self {
            dependent_type: dependent_type.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    #[must_use]
    pub fn with_reconcile_precondition(mut self, id: impl Into<String>) -> Self {
        self.reconcile_precondition = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_ready_postcondition(mut self, id: impl Into<String>) -> Self {
        self.ready_postcondition = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_delete_postcondition(mut self, id: impl Into<String>) -> Self {
        self.delete_postcondition = Some(id.into());
        self
    }
}

/// Declarations for every reconciler in the process, keyed by reconciler name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DeclarationSet {
    #[serde(default)]
    pub controllers: BTreeMap<String, ControllerDeclaration>,
}

impl DeclarationSet {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Loads the file named by `CONTROLLER_DECLARATIONS_PATH`, or an empty set
    pub fn from_operator_config(config: &OperatorConfig) -> Result<Self, ConfigurationError> {
        match &config.declarations_path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    #[must_use]
    pub fn with(mut self, reconciler: impl Into<String>, declaration: ControllerDeclaration) -> Self {
        self.controllers.insert(reconciler.into(), declaration);
        self
    }

    pub fn get(&self, reconciler: &str) -> Option<&ControllerDeclaration> {
        self.controllers.get(reconciler)
    }

    /// JSON schema of the declaration file format
    #[must_use]
    pub fn schema() -> schemars::Schema {
        schemars::schema_for!(DeclarationSet)
    }
}
