//! Tessera Core - Shared registries and types for the Tessera extension runtime.

mod capability;
mod error;
mod event;
mod registry;
mod services;
mod system;

pub use capability::{Ability, BehaviorFactory, Capability, CapabilityKind, ContentType};
pub use error::{CoreError, Result};
pub use event::{EventBus, Listener};
pub use registry::{CapabilityRegistry, Registry};
pub use services::Services;
pub use system::{StartFn, System, TickFn};
