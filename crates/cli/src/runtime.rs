//! Runtime assembly from a config document.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tessera_core::Services;
use tessera_engine::{RuntimeConfig, Scheduler};
use tessera_plugin::{ExtensionManager, PluginError};

use crate::catalog;

/// Service key of the shared [`TickCounter`].
pub const TICKS: &str = "ticks";

/// Per-system tick counts, shared with built-in extensions as a service.
#[derive(Debug, Clone, Default)]
pub struct TickCounter(Rc<RefCell<BTreeMap<String, u64>>>);

impl TickCounter {
    /// Counts one tick of `system`.
    pub fn record(&self, system: &str) {
        *self.0.borrow_mut().entry(system.to_string()).or_default() += 1;
    }

    /// Counts sorted by system ID.
    pub fn counts(&self) -> Vec<(String, u64)> {
        self.0
            .borrow()
            .iter()
            .map(|(id, count)| (id.clone(), *count))
            .collect()
    }
}

/// Why a configured extension did not load.
#[derive(Debug)]
pub enum LoadFailure {
    /// No built-in extension has this ID.
    Unknown,

    /// The manager refused or rolled back the load.
    Rejected(PluginError),
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadFailure::Unknown => f.write_str("no built-in extension with this ID"),
            LoadFailure::Rejected(e) => write!(f, "{}", e),
        }
    }
}

/// Outcome of loading a list of extensions.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub failed: Vec<(String, LoadFailure)>,
}

/// An extension manager wired to the CLI's services.
pub struct Runtime {
    pub manager: ExtensionManager,
    pub ticks: TickCounter,
}

impl Runtime {
    /// Creates an empty runtime using the config's scheduler settings.
    pub fn new(config: &RuntimeConfig) -> Self {
        let ticks = TickCounter::default();
        let mut services = Services::new();
        services.insert(TICKS, ticks.clone());

        let manager =
            ExtensionManager::new(Scheduler::from_config(&config.systems)).with_services(services);
        Self { manager, ticks }
    }

    /// Loads one built-in extension by ID.
    pub fn load(&mut self, id: &str) -> Result<(), LoadFailure> {
        let entry = catalog::find(id).ok_or(LoadFailure::Unknown)?;
        self.manager
            .load(entry.reference())
            .map(|_| ())
            .map_err(LoadFailure::Rejected)
    }

    /// Loads each ID independently, in order.
    pub fn load_all(&mut self, ids: &[String]) -> LoadReport {
        let mut report = LoadReport::default();
        for id in ids {
            match self.load(id) {
                Ok(()) => report.loaded.push(id.to_string()),
                Err(failure) => report.failed.push((id.to_string(), failure)),
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(order: &[&str], extensions: &[&str]) -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.systems.order = order.iter().map(|s| s.to_string()).collect();
        config.extensions = extensions.iter().map(|s| s.to_string()).collect();
        config
    }

    #[test]
    fn test_load_all_reports_failures() {
        let config = config(&[], &["core.input", "core.weather", "demo.unstable", "core.loot"]);
        let mut runtime = Runtime::new(&config);

        let report = runtime.load_all(&config.extensions);

        assert_eq!(report.loaded, vec!["core.input", "core.loot"]);
        assert_eq!(report.failed.len(), 2);
        assert!(matches!(report.failed[0], (ref id, LoadFailure::Unknown) if id == "core.weather"));
        assert!(matches!(
            report.failed[1].1,
            LoadFailure::Rejected(PluginError::RegistrationFailed { .. })
        ));
        assert_eq!(runtime.manager.loaded_ids(), vec!["core.input", "core.loot"]);
    }

    #[test]
    fn test_tick_counter_sees_systems() {
        let config = config(&["input", "movement"], &["core.input", "core.movement"]);
        let mut runtime = Runtime::new(&config);
        runtime.load_all(&config.extensions);

        for _ in 0..3 {
            runtime.manager.run(config.frame_delta());
        }

        assert_eq!(
            runtime.ticks.counts(),
            vec![("input".to_string(), 3), ("movement".to_string(), 3)]
        );
    }

    #[test]
    fn test_disabled_systems_are_not_counted() {
        let mut config = config(&["input", "movement"], &["core.input", "core.movement"]);
        config.systems.disabled = vec!["input".to_string()];
        let mut runtime = Runtime::new(&config);
        runtime.load_all(&config.extensions);

        runtime.manager.run(config.frame_delta());

        assert_eq!(runtime.ticks.counts(), vec![("movement".to_string(), 1)]);
    }
}
