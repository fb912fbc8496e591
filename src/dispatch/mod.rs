//! # Dispatch
//!
//! The per-event state machine, its outcomes and the persistence boundary it
//! writes through.

pub mod control;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod facade;
pub mod generation;

pub use control::DispatchControl;
pub use dispatcher::EventDispatcher;
pub use error::{DispatchError, FacadeError};
pub use event::{CustomResourceEvent, ResourceAction};
pub use facade::{KubeResourceFacade, ResourceFacade};
pub use generation::GenerationCache;
