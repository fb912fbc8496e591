//! # Persistence Facade
//!
//! The two writes the dispatcher performs: a status update and an
//! optimistic-lock replace of the whole resource.

use crate::api::resource::resource_key;
use crate::dispatch::error::FacadeError;
use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{self, Debug};
use std::marker::PhantomData;
use tracing::trace;

const FIELD_MANAGER: &str = "operator-core";

#[async_trait]
pub trait ResourceFacade<K>: Send + Sync {
    /// Persists the resource's status subresource
    async fn update_status(&self, resource: &K) -> Result<K, FacadeError>;

    /// Replaces the resource, conditioned on its captured resource version
    ///
    /// A version mismatch fails with [`FacadeError::Conflict`].
    async fn replace_with_lock(&self, resource: &K) -> Result<K, FacadeError>;
}

/// [`ResourceFacade`] over the Kubernetes API for namespaced resources
pub struct KubeResourceFacade<K> {
    client: Client,
    _resource: PhantomData<fn() -> K>,
}

impl<K> Debug for KubeResourceFacade<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeResourceFacade").finish_non_exhaustive()
    }
}

impl<K> KubeResourceFacade<K> {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }
}

impl<K> KubeResourceFacade<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug,
{
    fn api_for(&self, resource: &K) -> Result<(Api<K>, String), FacadeError> {
        let namespace = resource
            .namespace()
            .ok_or_else(|| FacadeError::MissingMetadata {
                resource: resource_key(resource),
                field: "namespace",
            })?;
        let name = resource
            .meta()
            .name
            .clone()
            .ok_or_else(|| FacadeError::MissingMetadata {
                resource: resource_key(resource),
                field: "name",
            })?;
        Ok((Api::namespaced(self.client.clone(), &namespace), name))
    }
}

#[async_trait]
impl<K> ResourceFacade<K> for KubeResourceFacade<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Serialize
        + Debug
        + Send
        + Sync
        + 'static,
{
    async fn update_status(&self, resource: &K) -> Result<K, FacadeError> {
        let (api, name) = self.api_for(resource)?;
        let status = serde_json::to_value(resource)?
            .get("status")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        let patch = serde_json::json!({ "status": status });
        trace!("Patching status of {}: {}", resource_key(resource), patch);

        Ok(api
            .patch_status(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(patch))
            .await?)
    }

    async fn replace_with_lock(&self, resource: &K) -> Result<K, FacadeError> {
        let (api, name) = self.api_for(resource)?;
        match api.replace(&name, &PostParams::default(), resource).await {
            Ok(replaced) => Ok(replaced),
            Err(kube::Error::Api(api_err)) if api_err.code == 409 => Err(FacadeError::Conflict {
                resource: resource_key(resource),
                resource_version: resource.resource_version(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
