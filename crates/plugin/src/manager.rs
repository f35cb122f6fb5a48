//! Extension lifecycle manager.
//!
//! Loading snapshots the key sets of every shared collection, runs the
//! extension's registration entry point, and diffs the key sets afterwards.
//! The diff is what the extension added; it is reversed on failure and
//! stored for exact unload on success. Extensions never have to report what
//! they registered.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tessera_core::{CapabilityKind, CapabilityRegistry, EventBus, Services};
use tessera_engine::Scheduler;

use crate::boundary::guarded;
use crate::context::ExtensionContext;
use crate::error::{PluginError, Result};
use crate::extension::{Extension, ExtensionRef};
use crate::resolver::resolve;
use crate::scope::ScopedSubscriber;

/// IDs an extension newly added, per collection, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddedIds {
    pub abilities: Vec<String>,
    pub content_types: Vec<String>,
    pub behavior_factories: Vec<String>,
    pub systems: Vec<String>,
}

impl AddedIds {
    /// Total number of added IDs.
    pub fn len(&self) -> usize {
        self.abilities.len()
            + self.content_types.len()
            + self.behavior_factories.len()
            + self.systems.len()
    }

    /// Returns true if nothing was added.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// IDs added for a capability kind.
    pub fn capabilities(&self, kind: CapabilityKind) -> &[String] {
        match kind {
            CapabilityKind::Ability => &self.abilities,
            CapabilityKind::ContentType => &self.content_types,
            CapabilityKind::BehaviorFactory => &self.behavior_factories,
        }
    }
}

/// Key sets captured before an extension's entry point runs.
struct Snapshot {
    abilities: HashSet<String>,
    content_types: HashSet<String>,
    behavior_factories: HashSet<String>,
    systems: HashSet<String>,
}

impl Snapshot {
    fn take(registry: &CapabilityRegistry, scheduler: &Scheduler) -> Self {
        Self {
            abilities: registry.ids(CapabilityKind::Ability).into_iter().collect(),
            content_types: registry.ids(CapabilityKind::ContentType).into_iter().collect(),
            behavior_factories: registry
                .ids(CapabilityKind::BehaviorFactory)
                .into_iter()
                .collect(),
            systems: scheduler.registered_ids().into_iter().collect(),
        }
    }

    /// Elements present now but absent from the snapshot.
    fn diff(&self, registry: &CapabilityRegistry, scheduler: &Scheduler) -> AddedIds {
        fn added(now: Vec<String>, before: &HashSet<String>) -> Vec<String> {
            now.into_iter().filter(|id| !before.contains(id)).collect()
        }

        AddedIds {
            abilities: added(registry.ids(CapabilityKind::Ability), &self.abilities),
            content_types: added(registry.ids(CapabilityKind::ContentType), &self.content_types),
            behavior_factories: added(
                registry.ids(CapabilityKind::BehaviorFactory),
                &self.behavior_factories,
            ),
            systems: added(scheduler.registered_ids(), &self.systems),
        }
    }
}

/// Everything needed to reverse a loaded extension.
struct Record {
    extension: Box<dyn Extension>,
    added: AddedIds,
    events: ScopedSubscriber,
}

/// Summary of a loaded extension.
#[derive(Debug, Clone)]
pub struct LoadedExtension {
    pub id: String,
    pub version: Option<String>,
    pub added: AddedIds,
    pub subscriptions: usize,
}

/// Loads and unloads extensions with transactional semantics.
///
/// `load` either leaves the extension fully present or restores the shared
/// collections and bus to their state before the call. `unload` runs the
/// extension's teardown on a best-effort basis, then unconditionally removes
/// everything recorded at load time.
pub struct ExtensionManager {
    registry: CapabilityRegistry,
    scheduler: Scheduler,
    services: Services,
    bus: Rc<EventBus>,
    records: HashMap<String, Record>,
    load_order: Vec<String>,
}

impl ExtensionManager {
    /// Creates a manager around a scheduler, with an empty registry and bus.
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            registry: CapabilityRegistry::new(),
            scheduler,
            services: Services::new(),
            bus: Rc::new(EventBus::new()),
            records: HashMap::new(),
            load_order: Vec::new(),
        }
    }

    /// Uses an existing shared bus.
    pub fn with_bus(mut self, bus: Rc<EventBus>) -> Self {
        self.bus = bus;
        self
    }

    /// Uses pre-populated collaborator services.
    pub fn with_services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    /// Resolves and loads an extension. Returns its ID.
    pub fn load(&mut self, reference: ExtensionRef) -> Result<String> {
        let mut extension = resolve(reference).ok_or(PluginError::ResolutionFailed)?;
        let id = extension.id().to_string();

        if self.records.contains_key(&id) {
            tracing::warn!(extension = %id, "extension is already loaded");
            return Err(PluginError::AlreadyLoaded(id));
        }

        let snapshot = Snapshot::take(&self.registry, &self.scheduler);
        let events = ScopedSubscriber::new(Rc::clone(&self.bus));

        let outcome = {
            let mut ctx = ExtensionContext::new(
                &id,
                &mut self.registry,
                &mut self.scheduler,
                &mut self.services,
                &events,
            );
            guarded(|| extension.register(&mut ctx))
        };

        let added = snapshot.diff(&self.registry, &self.scheduler);
        tracing::debug!(extension = %id, added = ?added, "computed registration diff");

        if let Err(e) = outcome {
            let removed = self.rollback(&added, &events);
            tracing::warn!(
                extension = %id,
                error = %e,
                rolled_back = removed,
                "extension failed to register"
            );
            return Err(PluginError::RegistrationFailed {
                id,
                reason: e.to_string(),
            });
        }

        tracing::info!(
            extension = %id,
            version = extension.version().unwrap_or("-"),
            abilities = added.abilities.len(),
            content_types = added.content_types.len(),
            behavior_factories = added.behavior_factories.len(),
            systems = added.systems.len(),
            subscriptions = events.subscription_count(),
            "extension loaded"
        );

        self.records.insert(
            id.clone(),
            Record {
                extension,
                added,
                events,
            },
        );
        self.load_order.push(id.clone());
        Ok(id)
    }

    /// Loads each reference independently. Returns the IDs that loaded, in order.
    pub fn load_multiple(
        &mut self,
        references: impl IntoIterator<Item = ExtensionRef>,
    ) -> Vec<String> {
        references
            .into_iter()
            .filter_map(|reference| self.load(reference).ok())
            .collect()
    }

    /// Unloads an extension.
    ///
    /// Teardown errors are logged and ignored; cleanup always runs.
    pub fn unload(&mut self, id: &str) -> Result<()> {
        let Some(mut record) = self.records.remove(id) else {
            return Err(PluginError::NotLoaded(id.to_string()));
        };
        self.load_order.retain(|loaded| loaded != id);

        let teardown = {
            let mut ctx = ExtensionContext::new(
                id,
                &mut self.registry,
                &mut self.scheduler,
                &mut self.services,
                &record.events,
            );
            let extension = &mut record.extension;
            guarded(|| extension.unregister(&mut ctx))
        };
        if let Err(e) = teardown {
            tracing::warn!(extension = %id, error = %e, "extension teardown failed");
        }

        let removed = self.rollback(&record.added, &record.events);
        tracing::info!(extension = %id, removed, "extension unloaded");
        Ok(())
    }

    /// Unloads every extension, last loaded first.
    pub fn unload_all(&mut self) {
        let ids: Vec<String> = self.load_order.iter().rev().cloned().collect();
        for id in ids {
            // Only fails for IDs that are no longer loaded
            let _ = self.unload(&id);
        }
    }

    /// IDs of loaded extensions, in load order.
    pub fn loaded_ids(&self) -> Vec<String> {
        self.load_order.clone()
    }

    /// Returns true if an extension is loaded under the ID.
    pub fn is_loaded(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Number of loaded extensions.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Describes a loaded extension.
    pub fn loaded(&self, id: &str) -> Option<LoadedExtension> {
        self.records.get(id).map(|record| LoadedExtension {
            id: id.to_string(),
            version: record.extension.version().map(str::to_string),
            added: record.added.clone(),
            subscriptions: record.events.subscription_count(),
        })
    }

    /// Runs one scheduler frame.
    pub fn run(&mut self, delta: f64) -> usize {
        self.scheduler.run(delta)
    }

    /// The capability registry.
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// The capability registry, mutably.
    pub fn registry_mut(&mut self) -> &mut CapabilityRegistry {
        &mut self.registry
    }

    /// The execution scheduler.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The execution scheduler, mutably.
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Shared collaborator services.
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Shared collaborator services, mutably.
    pub fn services_mut(&mut self) -> &mut Services {
        &mut self.services
    }

    /// The shared event bus.
    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    /// Reverses a diff. Returns the number of entries removed.
    fn rollback(&mut self, added: &AddedIds, events: &ScopedSubscriber) -> usize {
        let mut removed = 0;

        for id in added.systems.iter().rev() {
            removed += usize::from(self.scheduler.unregister(id));
        }
        for kind in CapabilityKind::ALL {
            for id in added.capabilities(kind).iter().rev() {
                removed += usize::from(self.registry.unregister(kind, id));
            }
        }

        removed + events.remove_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::ExtensionDescriptor;
    use tessera_core::{Ability, Listener, System};

    fn manager() -> ExtensionManager {
        ExtensionManager::new(Scheduler::new(Vec::new()))
    }

    #[test]
    fn test_load_records_diff() {
        let mut manager = manager();
        manager.registry_mut().register(Ability::new("base"));

        let id = manager
            .load(ExtensionRef::descriptor(ExtensionDescriptor::new("mod.dash", |ctx| {
                ctx.register_ability(Ability::new("dash"));
                ctx.add_system(System::new("dash_cooldowns", |_| {}));
                ctx.events().on("input", Listener::new(|_| {}));
                Ok(())
            })))
            .unwrap();

        let loaded = manager.loaded(&id).unwrap();
        assert_eq!(loaded.added.abilities, vec!["dash"]);
        assert_eq!(loaded.added.systems, vec!["dash_cooldowns"]);
        assert_eq!(loaded.subscriptions, 1);
        assert_eq!(manager.count(), 1);
    }

    #[test]
    fn test_duplicate_load_is_rejected() {
        let mut manager = manager();
        let make = || ExtensionRef::descriptor(ExtensionDescriptor::new("mod.a", |_| Ok(())));

        manager.load(make()).unwrap();
        let err = manager.load(make()).unwrap_err();

        assert!(matches!(err, PluginError::AlreadyLoaded(id) if id == "mod.a"));
        assert_eq!(manager.count(), 1);
    }

    #[test]
    fn test_unload_unknown() {
        let mut manager = manager();
        assert!(matches!(manager.unload("ghost"), Err(PluginError::NotLoaded(_))));
    }

    #[test]
    fn test_overwritten_capability_is_not_claimed() {
        let mut manager = manager();
        manager.registry_mut().register(Ability::new("shared"));

        manager
            .load(ExtensionRef::descriptor(ExtensionDescriptor::new("mod.b", |ctx| {
                ctx.register_ability(Ability::new("shared").with_cooldown(5.0));
                Ok(())
            })))
            .unwrap();

        assert!(manager.loaded("mod.b").unwrap().added.is_empty());
        manager.unload("mod.b").unwrap();
        assert!(manager.registry().get::<Ability>("shared").is_some());
    }

    #[test]
    fn test_panicking_registration_rolls_back() {
        let mut manager = manager();

        let err = manager
            .load(ExtensionRef::descriptor(ExtensionDescriptor::new("mod.bad", |ctx| {
                ctx.register_ability(Ability::new("half"));
                panic!("registration exploded");
            })))
            .unwrap_err();

        assert!(matches!(err, PluginError::RegistrationFailed { .. }));
        assert!(manager.registry().is_empty());
        assert!(!manager.is_loaded("mod.bad"));
    }

    #[test]
    fn test_run_delegates_to_scheduler() {
        let mut manager = manager();
        manager
            .load(ExtensionRef::descriptor(ExtensionDescriptor::new("mod.sys", |ctx| {
                ctx.add_system(System::new("noop", |_| {}));
                Ok(())
            })))
            .unwrap();

        assert_eq!(manager.run(0.016), 1);
        assert_eq!(manager.scheduler().frame(), 1);
    }
}
