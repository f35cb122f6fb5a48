//! Context bundle handed to extension entry points.

use tessera_core::{
    Ability, BehaviorFactory, CapabilityRegistry, ContentType, Services, System,
};
use tessera_engine::Scheduler;

use crate::error::Result;
use crate::scope::ScopedSubscriber;

/// The only surface through which an extension changes the runtime.
///
/// The context borrows the shared registries for the duration of one entry
/// point call and exposes the extension's own scoped subscriber, never the
/// raw bus.
pub struct ExtensionContext<'a> {
    extension_id: &'a str,
    registry: &'a mut CapabilityRegistry,
    scheduler: &'a mut Scheduler,
    services: &'a mut Services,
    events: &'a ScopedSubscriber,
}

impl<'a> ExtensionContext<'a> {
    pub(crate) fn new(
        extension_id: &'a str,
        registry: &'a mut CapabilityRegistry,
        scheduler: &'a mut Scheduler,
        services: &'a mut Services,
        events: &'a ScopedSubscriber,
    ) -> Self {
        Self {
            extension_id,
            registry,
            scheduler,
            services,
            events,
        }
    }

    /// ID of the extension this context was built for.
    pub fn extension_id(&self) -> &str {
        self.extension_id
    }

    /// The capability registry.
    pub fn registry(&self) -> &CapabilityRegistry {
        &*self.registry
    }

    /// The capability registry, mutably.
    pub fn registry_mut(&mut self) -> &mut CapabilityRegistry {
        &mut *self.registry
    }

    /// The execution scheduler.
    pub fn scheduler(&self) -> &Scheduler {
        &*self.scheduler
    }

    /// The execution scheduler, mutably.
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut *self.scheduler
    }

    /// Shared collaborator services.
    pub fn services(&self) -> &Services {
        &*self.services
    }

    /// Shared collaborator services, mutably.
    pub fn services_mut(&mut self) -> &mut Services {
        &mut *self.services
    }

    /// This extension's scoped view of the event bus.
    pub fn events(&self) -> &ScopedSubscriber {
        self.events
    }

    /// Registers an ability, replacing any with the same ID.
    pub fn register_ability(&mut self, ability: Ability) {
        self.registry.register(ability);
    }

    /// Registers a content type, replacing any with the same ID.
    pub fn register_content_type(&mut self, content_type: ContentType) {
        self.registry.register(content_type);
    }

    /// Registers a behavior factory, replacing any with the same ID.
    pub fn register_behavior_factory(&mut self, factory: BehaviorFactory) {
        self.registry.register(factory);
    }

    /// Adds a system to the scheduler.
    pub fn add_system(&mut self, system: System) {
        self.scheduler.register(system);
    }

    /// Builds a system from a registered behavior factory and schedules it.
    pub fn spawn_system(&mut self, factory_id: &str) -> Result<()> {
        let system = self.registry.require::<BehaviorFactory>(factory_id)?.create();
        self.scheduler.register(system);
        Ok(())
    }
}
