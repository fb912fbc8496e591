//! # Dependent Resource Graph
//!
//! Turns the dependents of a [`ControllerDeclaration`] into an ordered list
//! of [`DependentResourceSpec`] nodes. Names are unique, edges are carried as
//! declared and list order follows declaration order. Cycle detection and
//! graph traversal belong to the workflow executor.
//!
//! [`ControllerDeclaration`]: crate::configuration::ControllerDeclaration

use crate::api::condition::{Condition, ConditionKind};
use crate::api::filter::{GenericFilter, OnAddFilter, OnDeleteFilter, OnUpdateFilter};
use crate::configuration::declaration::DependentDeclaration;
use crate::configuration::error::ConfigurationError;
use crate::configuration::instantiate::Instantiator;
use crate::configuration::resolver::Namespaces;
use crate::registry::{DependentFamily, KubernetesDependentDeclaration};
use kube::api::DynamicObject;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

/// Runtime configuration of a Kubernetes dependent
#[derive(Debug, Clone)]
pub struct KubernetesDependentResourceConfig {
    namespaces: Namespaces,
    namespaces_explicitly_configured: bool,
    label_selector: Option<String>,
    on_add_filter: Option<Arc<dyn OnAddFilter<DynamicObject>>>,
    on_update_filter: Option<Arc<dyn OnUpdateFilter<DynamicObject>>>,
    on_delete_filter: Option<Arc<dyn OnDeleteFilter<DynamicObject>>>,
    generic_filter: Option<Arc<dyn GenericFilter<DynamicObject>>>,
}

impl KubernetesDependentResourceConfig {
    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// Whether the namespaces were declared on the dependent itself rather
    /// than inherited from the primary controller
    pub fn namespaces_explicitly_configured(&self) -> bool {
        self.namespaces_explicitly_configured
    }

    pub fn label_selector(&self) -> Option<&str> {
        self.label_selector.as_deref()
    }

    pub fn on_add_filter(&self) -> Option<&Arc<dyn OnAddFilter<DynamicObject>>> {
        self.on_add_filter.as_ref()
    }

    pub fn on_update_filter(&self) -> Option<&Arc<dyn OnUpdateFilter<DynamicObject>>> {
        self.on_update_filter.as_ref()
    }

    pub fn on_delete_filter(&self) -> Option<&Arc<dyn OnDeleteFilter<DynamicObject>>> {
        self.on_delete_filter.as_ref()
    }

    pub fn generic_filter(&self) -> Option<&Arc<dyn GenericFilter<DynamicObject>>> {
        self.generic_filter.as_ref()
    }
}

/// Per-family runtime configuration of a dependent
#[derive(Debug, Clone)]
pub enum DependentResourceConfig {
    Kubernetes(KubernetesDependentResourceConfig),
}

/// One node of the dependent resource graph
#[derive(Debug, Clone)]
pub struct DependentResourceSpec<K> {
    dependent_type: String,
    config: Option<DependentResourceConfig>,
    name: String,
    depends_on: BTreeSet<String>,
    reconcile_precondition: Option<Arc<dyn Condition<K>>>,
    ready_postcondition: Option<Arc<dyn Condition<K>>>,
    delete_postcondition: Option<Arc<dyn Condition<K>>>,
}

impl<K> DependentResourceSpec<K> {
    pub fn dependent_type(&self) -> &str {
        &self.dependent_type
    }

    pub fn config(&self) -> Option<&DependentResourceConfig> {
        self.config.as_ref()
    }

    /// The Kubernetes runtime configuration, if this is a Kubernetes dependent
    pub fn kubernetes_config(&self) -> Option<&KubernetesDependentResourceConfig> {
        match &self.config {
            Some(DependentResourceConfig::Kubernetes(config)) => Some(config),
            None => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn depends_on(&self) -> &BTreeSet<String> {
        &self.depends_on
    }

    pub fn condition(&self, kind: ConditionKind) -> Option<&Arc<dyn Condition<K>>> {
        match kind {
            ConditionKind::ReconcilePrecondition => self.reconcile_precondition.as_ref(),
            ConditionKind::ReadyPostcondition => self.ready_postcondition.as_ref(),
            ConditionKind::DeletePostcondition => self.delete_postcondition.as_ref(),
        }
    }

    pub fn reconcile_precondition(&self) -> Option<&Arc<dyn Condition<K>>> {
        self.reconcile_precondition.as_ref()
    }

    pub fn ready_postcondition(&self) -> Option<&Arc<dyn Condition<K>>> {
        self.ready_postcondition.as_ref()
    }

    pub fn delete_postcondition(&self) -> Option<&Arc<dyn Condition<K>>> {
        self.delete_postcondition.as_ref()
    }
}

/// Builds the dependent graph in declaration order
pub(crate) fn build_dependent_specs<K: Debug + 'static>(
    instantiator: &Instantiator<'_, K>,
    declarations: &[DependentDeclaration],
    parent_namespaces: &Namespaces,
) -> Result<Vec<DependentResourceSpec<K>>, ConfigurationError> {
    let mut specs: Vec<DependentResourceSpec<K>> = Vec::with_capacity(declarations.len());
    let mut index_by_name: HashMap<String, usize> = HashMap::with_capacity(declarations.len());

    for declaration in declarations {
        let name = declaration
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&declaration.dependent_type)
            .to_owned();

        if let Some(&existing) = index_by_name.get(&name) {
            return Err(ConfigurationError::DuplicateDependent {
                name,
                existing: format!("{:?}", specs[existing]),
            });
        }

        let family = instantiator
            .registry
            .dependents
            .get(&declaration.dependent_type)
            .ok_or_else(|| ConfigurationError::UnknownDependentType {
                reconciler: instantiator.reconciler.to_owned(),
                dependent_type: declaration.dependent_type.clone(),
            })?;

        let config = match family {
            DependentFamily::Kubernetes(kube_declaration) => {
                Some(DependentResourceConfig::Kubernetes(kubernetes_config(
                    instantiator,
                    &declaration.dependent_type,
                    kube_declaration,
                    parent_namespaces,
                )?))
            }
            DependentFamily::Standalone => None,
        };

        let spec = DependentResourceSpec {
            dependent_type: declaration.dependent_type.clone(),
            config,
            name: name.clone(),
            depends_on: declaration.depends_on.iter().cloned().collect(),
            reconcile_precondition: instantiator.condition(
                ConditionKind::ReconcilePrecondition,
                declaration.reconcile_precondition.as_deref(),
            )?,
            ready_postcondition: instantiator.condition(
                ConditionKind::ReadyPostcondition,
                declaration.ready_postcondition.as_deref(),
            )?,
            delete_postcondition: instantiator.condition(
                ConditionKind::DeletePostcondition,
                declaration.delete_postcondition.as_deref(),
            )?,
        };

        debug!(
            "Resolved dependent resource '{}' of type '{}' depending on {:?}",
            spec.name, spec.dependent_type, spec.depends_on
        );
        index_by_name.insert(name, specs.len());
        specs.push(spec);
    }

    Ok(specs)
}

fn kubernetes_config<K: 'static>(
    instantiator: &Instantiator<'_, K>,
    dependent_type: &str,
    declaration: &KubernetesDependentDeclaration,
    parent_namespaces: &Namespaces,
) -> Result<KubernetesDependentResourceConfig, ConfigurationError> {
    let declared = Namespaces::from_declared(&declaration.namespaces);
    let namespaces_explicitly_configured = !declared.is_all();
    let namespaces = if namespaces_explicitly_configured {
        declared
    } else {
        parent_namespaces.clone()
    };

    let label_selector = declaration
        .label_selector
        .clone()
        .filter(|selector| !selector.is_empty());

    let origin = format!("KubernetesDependent declaration of '{dependent_type}'");
    let filters = &instantiator.registry.dependent_filters;

    Ok(KubernetesDependentResourceConfig {
        namespaces,
        namespaces_explicitly_configured,
        label_selector,
        on_add_filter: instantiator.filter(
            &filters.on_add,
            declaration.on_add_filter.as_deref(),
            &origin,
        )?,
        on_update_filter: instantiator.filter(
            &filters.on_update,
            declaration.on_update_filter.as_deref(),
            &origin,
        )?,
        on_delete_filter: instantiator.filter(
            &filters.on_delete,
            declaration.on_delete_filter.as_deref(),
            &origin,
        )?,
        generic_filter: instantiator.filter(
            &filters.generic,
            declaration.generic_filter.as_deref(),
            &origin,
        )?,
    })
}
