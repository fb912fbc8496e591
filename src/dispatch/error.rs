//! # Dispatch Errors
//!
//! Errors raised while interpreting a single event. None of them escape
//! [`crate::dispatch::EventDispatcher::handle_event`]; each is logged and
//! turned into an error outcome.

use thiserror::Error;

/// Persistence failures reported by a [`crate::dispatch::ResourceFacade`]
#[derive(Debug, Error)]
pub enum FacadeError {
    #[error("Optimistic lock conflict on {resource} (resource version {resource_version:?})")]
    Conflict {
        resource: String,
        resource_version: Option<String>,
    },

    #[error("Resource {resource} has no {field}")]
    MissingMetadata {
        resource: String,
        field: &'static str,
    },

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FacadeError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, FacadeError::Conflict { .. })
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Reconciler {hook} hook failed: {source:#}")]
    Reconciler {
        hook: &'static str,
        source: anyhow::Error,
    },

    #[error("Persistence failed: {0}")]
    Persistence(#[from] FacadeError),

    #[error("Resource {resource} has no {field}")]
    MissingMetadata {
        resource: String,
        field: &'static str,
    },

    #[error("Reconciler panicked: {0}")]
    Panicked(String),
}
