//! Capability kinds and the payloads extensions register.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::{CapabilityRegistry, Registry};
use crate::system::System;

/// The independent collections held by the capability registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Ability,
    ContentType,
    BehaviorFactory,
}

impl CapabilityKind {
    /// All kinds, in the order they are snapshotted.
    pub const ALL: [CapabilityKind; 3] = [
        CapabilityKind::Ability,
        CapabilityKind::ContentType,
        CapabilityKind::BehaviorFactory,
    ];

    /// Returns the stable name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::Ability => "ability",
            CapabilityKind::ContentType => "content type",
            CapabilityKind::BehaviorFactory => "behavior factory",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payload that lives in one of the capability registry's collections.
///
/// The registry never inspects a payload beyond its ID; the associated
/// `KIND` and slot accessors route typed calls to the right collection.
pub trait Capability: Sized + 'static {
    /// The collection this payload belongs to.
    const KIND: CapabilityKind;

    /// Returns the registry key of this payload.
    fn id(&self) -> &str;

    /// Returns the collection holding this payload type.
    fn slot(registry: &CapabilityRegistry) -> &Registry<Self>;

    /// Returns the collection holding this payload type, mutably.
    fn slot_mut(registry: &mut CapabilityRegistry) -> &mut Registry<Self>;
}

/// A gameplay ability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ability {
    /// Ability identifier.
    pub id: String,

    /// Human-readable name.
    pub name: Option<String>,

    /// Cooldown in seconds.
    pub cooldown: f64,

    /// Opaque ability parameters.
    pub params: Value,
}

impl Ability {
    /// Creates a new ability with the given ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            cooldown: 0.0,
            params: Value::Null,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the cooldown.
    pub fn with_cooldown(mut self, seconds: f64) -> Self {
        self.cooldown = seconds.max(0.0);
        self
    }

    /// Sets the ability parameters.
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }
}

impl Capability for Ability {
    const KIND: CapabilityKind = CapabilityKind::Ability;

    fn id(&self) -> &str {
        &self.id
    }

    fn slot(registry: &CapabilityRegistry) -> &Registry<Self> {
        &registry.abilities
    }

    fn slot_mut(registry: &mut CapabilityRegistry) -> &mut Registry<Self> {
        &mut registry.abilities
    }
}

/// A content type (enemy, item, tile...) that the game can spawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentType {
    /// Content type identifier.
    pub id: String,

    /// Grouping used by tools and spawners.
    pub category: String,

    /// Opaque content definition.
    pub schema: Value,
}

impl ContentType {
    /// Creates a new content type in the given category.
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            schema: Value::Null,
        }
    }

    /// Sets the content definition.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }
}

impl Capability for ContentType {
    const KIND: CapabilityKind = CapabilityKind::ContentType;

    fn id(&self) -> &str {
        &self.id
    }

    fn slot(registry: &CapabilityRegistry) -> &Registry<Self> {
        &registry.content_types
    }

    fn slot_mut(registry: &mut CapabilityRegistry) -> &mut Registry<Self> {
        &mut registry.content_types
    }
}

/// Builds fresh tick behaviors on demand.
#[derive(Clone)]
pub struct BehaviorFactory {
    /// Factory identifier.
    pub id: String,

    /// Human-readable description.
    pub description: Option<String>,

    build: Rc<dyn Fn() -> System>,
}

impl BehaviorFactory {
    /// Creates a new factory.
    pub fn new(id: impl Into<String>, build: impl Fn() -> System + 'static) -> Self {
        Self {
            id: id.into(),
            description: None,
            build: Rc::new(build),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builds a new system instance.
    pub fn create(&self) -> System {
        (self.build)()
    }
}

impl fmt::Debug for BehaviorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorFactory")
            .field("id", &self.id)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl Capability for BehaviorFactory {
    const KIND: CapabilityKind = CapabilityKind::BehaviorFactory;

    fn id(&self) -> &str {
        &self.id
    }

    fn slot(registry: &CapabilityRegistry) -> &Registry<Self> {
        &registry.behavior_factories
    }

    fn slot_mut(registry: &mut CapabilityRegistry) -> &mut Registry<Self> {
        &mut registry.behavior_factories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_ability_builder() {
        let ability = Ability::new("fireball")
            .with_name("Fireball")
            .with_cooldown(-3.0)
            .with_params(serde_json::json!({ "damage": 12 }));

        assert_eq!(ability.id(), "fireball");
        assert_eq!(ability.name.as_deref(), Some("Fireball"));
        assert_eq!(ability.cooldown, 0.0);
        assert_eq!(ability.params["damage"], 12);
    }

    #[test]
    fn test_behavior_factory_builds_fresh_systems() {
        let built = Rc::new(Cell::new(0));
        let counter = Rc::clone(&built);
        let factory = BehaviorFactory::new("spawner", move || {
            counter.set(counter.get() + 1);
            System::new("spawner", |_| {})
        });

        let a = factory.create();
        let b = factory.create();

        assert_eq!(a.id(), "spawner");
        assert_eq!(b.id(), "spawner");
        assert_eq!(built.get(), 2);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(CapabilityKind::ContentType.to_string(), "content type");
        assert_eq!(CapabilityKind::ALL.len(), 3);
    }
}
