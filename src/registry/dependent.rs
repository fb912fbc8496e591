//! Dependent resource types known to the resolver.
//!
//! A dependent type is either a Kubernetes dependent, which carries scoping
//! and filter settings turned into a runtime configuration, or a standalone
//! dependent that the resolver only names and gates.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Type-level settings of a Kubernetes dependent resource
///
/// An empty `namespaces` list inherits the primary controller's namespaces.
/// Filter fields hold dependent filter identifiers; `None` means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesDependentDeclaration {
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub label_selector: Option<String>,
    #[serde(default)]
    pub on_add_filter: Option<String>,
    #[serde(default)]
    pub on_update_filter: Option<String>,
    #[serde(default)]
    pub on_delete_filter: Option<String>,
    #[serde(default)]
    pub generic_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependentFamily {
    Kubernetes(KubernetesDependentDeclaration),
    Standalone,
}

#[derive(Debug, Default)]
pub struct DependentTypeRegistry {
    types: HashMap<String, DependentFamily>,
}

impl DependentTypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_kubernetes(
        &mut self,
        id: impl Into<String>,
        declaration: KubernetesDependentDeclaration,
    ) -> &mut Self {
        self.types
            .insert(id.into(), DependentFamily::Kubernetes(declaration));
        self
    }

    pub fn register_standalone(&mut self, id: impl Into<String>) -> &mut Self {
        self.types.insert(id.into(), DependentFamily::Standalone);
        self
    }

    pub fn get(&self, id: &str) -> Option<&DependentFamily> {
        self.types.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }
}
