//! # Operator Core
//!
//! Reconciliation core for Kubernetes operators built on kube-rs.
//!
//! - [`configuration`] resolves a reconciler's declaration (finalizer,
//!   namespaces, filters, retry and rate limiting, dependent resources) into
//!   an immutable [`configuration::ControllerConfiguration`]
//! - [`dispatch`] runs each resource event through the finalizer, generation
//!   and delete-versus-upsert state machine and persists what the reconciler
//!   asks for
//! - [`controller`] ties the two together for one reconciler
//!
//! Watching, scheduling and the dependent resource workflow executor live
//! outside this crate; [`dispatch::CustomResourceEvent::from_watch_event`]
//! and [`dispatch::DispatchControl::to_action`] adapt to `kube_runtime`.

pub mod api;
pub mod config;
pub mod configuration;
pub mod constants;
pub mod controller;
pub mod dispatch;
pub mod observability;
pub mod policy;
pub mod prelude;
pub mod registry;
