//! Capability registry with insertion-ordered collections.

use std::collections::HashMap;

use crate::capability::{Ability, BehaviorFactory, Capability, CapabilityKind, ContentType};
use crate::error::{CoreError, Result};

/// A keyed collection that remembers insertion order.
///
/// Replacing an existing key keeps the key's original position.
#[derive(Debug)]
pub struct Registry<T> {
    /// Entries by ID.
    entries: HashMap<String, T>,

    /// IDs in insertion order.
    order: Vec<String>,
}

impl<T> Registry<T> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Inserts or replaces an entry, returning the replaced value.
    pub fn insert(&mut self, id: impl Into<String>, value: T) -> Option<T> {
        let id = id.into();
        let previous = self.entries.insert(id.clone(), value);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    /// Gets an entry by ID.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id)
    }

    /// Gets an entry by ID, mutably.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.entries.get_mut(id)
    }

    /// Removes an entry by ID.
    pub fn remove(&mut self, id: &str) -> Option<T> {
        let removed = self.entries.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }

    /// Returns true if an entry exists for the ID.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns IDs in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Returns entries in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide store of abilities, content types, and behavior factories.
///
/// Registration is an unconditional upsert: a later registration under an
/// existing ID silently replaces the earlier one.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    pub(crate) abilities: Registry<Ability>,
    pub(crate) content_types: Registry<ContentType>,
    pub(crate) behavior_factories: Registry<BehaviorFactory>,
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a capability, returning the one it replaced.
    pub fn register<C: Capability>(&mut self, capability: C) -> Option<C> {
        let id = capability.id().to_string();
        let replaced = C::slot_mut(self).insert(id.clone(), capability);
        if replaced.is_some() {
            tracing::trace!(kind = %C::KIND, id = %id, "capability replaced");
        }
        replaced
    }

    /// Gets a capability by ID.
    pub fn get<C: Capability>(&self, id: &str) -> Option<&C> {
        C::slot(self).get(id)
    }

    /// Gets a capability by ID, failing if it is not registered.
    pub fn require<C: Capability>(&self, id: &str) -> Result<&C> {
        self.get::<C>(id).ok_or_else(|| CoreError::CapabilityNotFound {
            kind: C::KIND,
            id: id.to_string(),
        })
    }

    /// Returns all capabilities of a type in insertion order.
    pub fn all<C: Capability>(&self) -> impl Iterator<Item = &C> {
        C::slot(self).values()
    }

    /// Removes a capability by kind and ID. Returns true if one was removed.
    pub fn unregister(&mut self, kind: CapabilityKind, id: &str) -> bool {
        match kind {
            CapabilityKind::Ability => self.abilities.remove(id).is_some(),
            CapabilityKind::ContentType => self.content_types.remove(id).is_some(),
            CapabilityKind::BehaviorFactory => self.behavior_factories.remove(id).is_some(),
        }
    }

    /// Returns true if a capability of the kind is registered under the ID.
    pub fn contains(&self, kind: CapabilityKind, id: &str) -> bool {
        match kind {
            CapabilityKind::Ability => self.abilities.contains(id),
            CapabilityKind::ContentType => self.content_types.contains(id),
            CapabilityKind::BehaviorFactory => self.behavior_factories.contains(id),
        }
    }

    /// Returns the IDs registered for a kind, in insertion order.
    pub fn ids(&self, kind: CapabilityKind) -> Vec<String> {
        let ids: Vec<&str> = match kind {
            CapabilityKind::Ability => self.abilities.ids().collect(),
            CapabilityKind::ContentType => self.content_types.ids().collect(),
            CapabilityKind::BehaviorFactory => self.behavior_factories.ids().collect(),
        };
        ids.into_iter().map(str::to_string).collect()
    }

    /// Returns the number of capabilities registered for a kind.
    pub fn len(&self, kind: CapabilityKind) -> usize {
        match kind {
            CapabilityKind::Ability => self.abilities.len(),
            CapabilityKind::ContentType => self.content_types.len(),
            CapabilityKind::BehaviorFactory => self.behavior_factories.len(),
        }
    }

    /// Returns true if no capability of any kind is registered.
    pub fn is_empty(&self) -> bool {
        CapabilityKind::ALL.iter().all(|kind| self.len(*kind) == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::System;

    #[test]
    fn test_register_and_get() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Ability::new("dash"));
        registry.register(ContentType::new("slime", "enemy"));

        assert!(registry.get::<Ability>("dash").is_some());
        assert!(registry.get::<ContentType>("slime").is_some());
        assert!(registry.get::<Ability>("slime").is_none());
        assert!(registry.contains(CapabilityKind::ContentType, "slime"));
    }

    #[test]
    fn test_register_replaces_silently() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Ability::new("a"));
        registry.register(Ability::new("b"));
        let replaced = registry.register(Ability::new("a").with_cooldown(2.0));

        assert!(replaced.is_some());
        assert_eq!(registry.len(CapabilityKind::Ability), 2);
        assert_eq!(registry.require::<Ability>("a").unwrap().cooldown, 2.0);
        // Replacement keeps the original position
        assert_eq!(registry.ids(CapabilityKind::Ability), vec!["a", "b"]);
    }

    #[test]
    fn test_all_preserves_insertion_order() {
        let mut registry = CapabilityRegistry::new();
        for id in ["z", "x", "y"] {
            registry.register(ContentType::new(id, "item"));
        }

        let ids: Vec<&str> = registry.all::<ContentType>().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "x", "y"]);
    }

    #[test]
    fn test_unregister() {
        let mut registry = CapabilityRegistry::new();
        registry.register(BehaviorFactory::new("spawner", || System::new("spawner", |_| {})));

        assert!(registry.unregister(CapabilityKind::BehaviorFactory, "spawner"));
        assert!(!registry.unregister(CapabilityKind::BehaviorFactory, "spawner"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_require_missing() {
        let registry = CapabilityRegistry::new();
        let err = registry.require::<Ability>("nope").unwrap_err();
        assert_eq!(err.to_string(), "ability 'nope' not found");
    }
}
