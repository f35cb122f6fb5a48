//! Extension descriptors and references.

use std::fmt;

use crate::context::ExtensionContext;
use crate::error::Result;

/// An independently authored unit that registers capabilities into the runtime.
///
/// `register` is called once on load. `unregister` is called on unload
/// before the runtime removes everything the extension added, so it only
/// needs to undo effects the runtime cannot see.
pub trait Extension {
    /// Unique extension ID.
    fn id(&self) -> &str;

    /// Optional version string.
    fn version(&self) -> Option<&str> {
        None
    }

    /// Registration entry point.
    fn register(&mut self, ctx: &mut ExtensionContext<'_>) -> Result<()>;

    /// Optional teardown entry point.
    fn unregister(&mut self, _ctx: &mut ExtensionContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Entry point closure used by [`ExtensionDescriptor`].
pub type EntryPoint = Box<dyn FnMut(&mut ExtensionContext<'_>) -> Result<()>>;

/// A closure-based extension.
pub struct ExtensionDescriptor {
    id: String,
    version: Option<String>,
    register: EntryPoint,
    unregister: Option<EntryPoint>,
}

impl ExtensionDescriptor {
    /// Creates a descriptor with a registration entry point.
    pub fn new(
        id: impl Into<String>,
        register: impl FnMut(&mut ExtensionContext<'_>) -> Result<()> + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            version: None,
            register: Box::new(register),
            unregister: None,
        }
    }

    /// Sets the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the teardown entry point.
    pub fn with_unregister(
        mut self,
        unregister: impl FnMut(&mut ExtensionContext<'_>) -> Result<()> + 'static,
    ) -> Self {
        self.unregister = Some(Box::new(unregister));
        self
    }
}

impl Extension for ExtensionDescriptor {
    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn register(&mut self, ctx: &mut ExtensionContext<'_>) -> Result<()> {
        (self.register)(ctx)
    }

    fn unregister(&mut self, ctx: &mut ExtensionContext<'_>) -> Result<()> {
        match self.unregister.as_mut() {
            Some(unregister) => unregister(ctx),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ExtensionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionDescriptor")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("has_unregister", &self.unregister.is_some())
            .finish_non_exhaustive()
    }
}

/// Constructor invoked to obtain a descriptor.
pub type ExtensionFactory = Box<dyn FnOnce() -> Result<Box<dyn Extension>>>;

/// A raw reference to an extension: a built descriptor or a constructor.
pub enum ExtensionRef {
    /// An already-constructed extension.
    Descriptor(Box<dyn Extension>),

    /// A zero-argument constructor that must be invoked to obtain one.
    Factory(ExtensionFactory),
}

impl ExtensionRef {
    /// Wraps a constructed extension.
    pub fn descriptor(extension: impl Extension + 'static) -> Self {
        ExtensionRef::Descriptor(Box::new(extension))
    }

    /// Wraps a constructor.
    pub fn factory<E, F>(factory: F) -> Self
    where
        E: Extension + 'static,
        F: FnOnce() -> Result<E> + 'static,
    {
        ExtensionRef::Factory(Box::new(move || {
            factory().map(|extension| Box::new(extension) as Box<dyn Extension>)
        }))
    }
}

impl fmt::Debug for ExtensionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionRef::Descriptor(extension) => {
                f.debug_tuple("Descriptor").field(&extension.id()).finish()
            }
            ExtensionRef::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}
