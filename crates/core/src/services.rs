//! Shared collaborator services exposed to extensions.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;

use crate::error::{CoreError, Result};

/// String-keyed store of typed services (asset loaders, world handles...).
///
/// The runtime does not track which extension inserted a service; it is
/// not part of the load/unload diff.
#[derive(Default)]
pub struct Services {
    entries: HashMap<String, Box<dyn Any>>,
}

impl Services {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a service. Returns true if one was replaced.
    pub fn insert<T: Any>(&mut self, key: impl Into<String>, service: T) -> bool {
        self.entries.insert(key.into(), Box::new(service)).is_some()
    }

    /// Gets a service by key and type.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|s| s.downcast_ref::<T>())
    }

    /// Gets a service by key and type, mutably.
    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.entries.get_mut(key).and_then(|s| s.downcast_mut::<T>())
    }

    /// Gets a service, reporting why it is unavailable.
    pub fn require<T: Any>(&self, key: &str) -> Result<&T> {
        let service = self
            .entries
            .get(key)
            .ok_or_else(|| CoreError::ServiceNotFound(key.to_string()))?;

        service
            .downcast_ref::<T>()
            .ok_or_else(|| CoreError::ServiceTypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Removes a service. Returns true if it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Returns true if a service is stored under the key.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the stored keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        keys
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").field("keys", &self.keys()).finish()
    }
}
