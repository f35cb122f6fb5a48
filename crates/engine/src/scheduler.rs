//! Deterministic per-frame system scheduling.

use std::collections::{HashMap, HashSet};

use tessera_core::System;

use crate::config::SchedulerConfig;

/// Runs registered systems once per frame in the configured order.
///
/// The execution order is rebuilt lazily: mutations only mark it dirty and
/// the next `run` recomputes it. Configured IDs come first, in configured
/// order; registered systems absent from the configuration follow in
/// registration order.
pub struct Scheduler {
    /// Registered systems by ID.
    systems: HashMap<String, System>,

    /// IDs in registration order.
    registration_order: Vec<String>,

    /// Externally configured order. Read-only.
    configured_order: Vec<String>,

    /// Systems that start disabled when registered.
    disabled_on_register: HashSet<String>,

    /// Cached execution order.
    execution_order: Vec<String>,

    /// Whether the cached order is stale.
    dirty: bool,

    /// Number of completed runs.
    frame: u64,
}

impl Scheduler {
    /// Creates a scheduler with the given configured order.
    pub fn new(configured_order: Vec<String>) -> Self {
        Self {
            systems: HashMap::new(),
            registration_order: Vec::new(),
            configured_order,
            disabled_on_register: HashSet::new(),
            execution_order: Vec::new(),
            dirty: true,
            frame: 0,
        }
    }

    /// Creates a scheduler from configuration.
    pub fn from_config(config: &SchedulerConfig) -> Self {
        let mut scheduler = Self::new(config.order.clone());
        scheduler.disabled_on_register = config.disabled.iter().cloned().collect();
        scheduler
    }

    /// Registers a system, replacing any system with the same ID.
    ///
    /// A replacement keeps the original registration position.
    pub fn register(&mut self, mut system: System) -> Option<System> {
        let id = system.id().to_string();
        if self.disabled_on_register.contains(&id) {
            system.set_enabled(false);
        }

        let replaced = self.systems.insert(id.clone(), system);
        if replaced.is_none() {
            self.registration_order.push(id);
        }
        self.dirty = true;
        replaced
    }

    /// Unregisters a system. Returns true if it was registered.
    pub fn unregister(&mut self, id: &str) -> bool {
        if self.systems.remove(id).is_none() {
            return false;
        }
        self.registration_order.retain(|existing| existing != id);
        self.dirty = true;
        true
    }

    /// Enables or disables a system without touching the order.
    ///
    /// Returns false if no system is registered under the ID.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.systems.get_mut(id) {
            Some(system) => {
                system.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    /// Returns true if the system is registered and enabled.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.systems.get(id).is_some_and(System::is_enabled)
    }

    /// Returns true if a system is registered under the ID.
    pub fn contains(&self, id: &str) -> bool {
        self.systems.contains_key(id)
    }

    /// Runs one frame. Returns the number of systems ticked.
    pub fn run(&mut self, delta: f64) -> usize {
        if self.dirty {
            self.rebuild();
        }

        let mut ticked = 0;
        for id in &self.execution_order {
            if let Some(system) = self.systems.get_mut(id) {
                if system.is_enabled() {
                    system.tick(delta);
                    ticked += 1;
                }
            }
        }

        self.frame += 1;
        ticked
    }

    /// Returns the resolved execution order, rebuilding it if stale.
    pub fn execution_order(&mut self) -> &[String] {
        if self.dirty {
            self.rebuild();
        }
        &self.execution_order
    }

    /// Configured IDs with no registered system.
    pub fn missing_systems(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.configured_order
            .iter()
            .filter(|id| !self.systems.contains_key(*id) && seen.insert(id.as_str()))
            .cloned()
            .collect()
    }

    /// Registered IDs absent from the configured order, in registration order.
    pub fn unmapped_systems(&self) -> Vec<String> {
        let configured: HashSet<&str> = self.configured_order.iter().map(|s| s.as_str()).collect();
        self.registration_order
            .iter()
            .filter(|id| !configured.contains(id.as_str()))
            .cloned()
            .collect()
    }

    /// Registered IDs in registration order.
    pub fn registered_ids(&self) -> Vec<String> {
        self.registration_order.clone()
    }

    /// The configured order this scheduler was created with.
    pub fn configured_order(&self) -> &[String] {
        &self.configured_order
    }

    /// Returns the number of registered systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns true if no systems are registered.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Returns the number of completed runs.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    fn rebuild(&mut self) {
        let mut order = Vec::with_capacity(self.systems.len());
        let mut placed = HashSet::new();

        for id in &self.configured_order {
            if self.systems.contains_key(id) && placed.insert(id.as_str()) {
                order.push(id.clone());
            }
        }

        for id in &self.registration_order {
            if !placed.contains(id.as_str()) {
                order.push(id.clone());
            }
        }

        let missing = self.missing_systems();
        if !missing.is_empty() {
            tracing::warn!(missing = ?missing, "configured systems are not registered");
        }
        tracing::debug!(order = ?order, "rebuilt execution order");

        self.execution_order = order;
        self.dirty = false;
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("registered", &self.registration_order)
            .field("configured_order", &self.configured_order)
            .field("dirty", &self.dirty)
            .field("frame", &self.frame)
            .finish()
    }
}
