//! Tessera Plugin - Extension loading and lifecycle management.
//!
//! Extensions register abilities, content types, behavior factories,
//! scheduled systems, and event listeners into shared registries. The
//! [`ExtensionManager`] records exactly what each extension added so that a
//! failed load rolls back completely and an unload leaves no residue.

mod boundary;
mod context;
mod error;
mod extension;
mod manager;
mod resolver;
mod scope;

pub use context::ExtensionContext;
pub use error::{PluginError, Result};
pub use extension::{EntryPoint, Extension, ExtensionDescriptor, ExtensionFactory, ExtensionRef};
pub use manager::{AddedIds, ExtensionManager, LoadedExtension};
pub use resolver::resolve;
pub use scope::ScopedSubscriber;
