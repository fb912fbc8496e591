//! # Controller Configuration
//!
//! Declarations, their resolution into runtime configuration and the
//! dependent resource graph builder.

pub mod declaration;
pub mod dependent;
pub mod duration;
pub mod error;
mod instantiate;
pub mod resolver;
pub mod validation;

pub use declaration::{ControllerDeclaration, DeclarationSet, DependentDeclaration};
pub use dependent::{
    DependentResourceConfig, DependentResourceSpec, KubernetesDependentResourceConfig,
};
pub use duration::{IntervalDeclaration, TimeUnit};
pub use error::ConfigurationError;
pub use resolver::{ConfigurationResolver, ControllerConfiguration, Namespaces};
