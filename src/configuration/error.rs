//! # Configuration Errors
//!
//! Every variant is fatal: a controller whose configuration fails to resolve
//! is never started.

use crate::registry::ArtifactKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Missing mandatory controller declaration for reconciler: {reconciler}")]
    MissingDeclaration { reconciler: String },

    #[error(
        "{finalizer} is not a valid finalizer for reconciler {reconciler}: {reason}. \
         See https://kubernetes.io/docs/concepts/overview/working-with-objects/finalizers/ for details"
    )]
    InvalidFinalizer {
        reconciler: String,
        finalizer: String,
        reason: String,
    },

    #[error(
        "Couldn't instantiate {kind} '{target}' for '{reconciler}' reconciler. \
         You need to register it with an accessible no-argument constructor: {reason}"
    )]
    Instantiation {
        reconciler: String,
        kind: ArtifactKind,
        target: String,
        reason: String,
    },

    #[error("Couldn't create {kind} '{target}' from {origin} for reconciler {reconciler}: {reason}")]
    FilterCreation {
        reconciler: String,
        kind: ArtifactKind,
        target: String,
        origin: String,
        reason: String,
    },

    #[error("A dependent resource named: {name} already exists: {existing}")]
    DuplicateDependent { name: String, existing: String },

    #[error("Unknown dependent resource type '{dependent_type}' declared by reconciler {reconciler}")]
    UnknownDependentType {
        reconciler: String,
        dependent_type: String,
    },

    #[error("Invalid maxReconciliationInterval for reconciler {reconciler}: {reason}")]
    InvalidInterval { reconciler: String, reason: String },

    #[error("Invalid controller declarations: {0}")]
    InvalidDeclarations(#[from] serde_yaml::Error),

    #[error("Failed to read controller declarations from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
