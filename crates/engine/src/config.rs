//! Runtime configuration document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Top-level configuration read from `tessera.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Frames per second driven by the frame loop.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,

    /// Number of frames to run (0 runs until interrupted).
    #[serde(default)]
    pub frames: u64,

    /// Scheduler ordering.
    #[serde(default)]
    pub systems: SchedulerConfig,

    /// Extension IDs to load, in load order.
    #[serde(default)]
    pub extensions: Vec<String>,
}

fn default_tick_rate() -> u32 {
    60
}

/// Highest accepted tick rate.
pub const MAX_TICK_RATE: u32 = 1000;

/// Scheduler configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// System IDs in execution order. This is the sole authority on order.
    #[serde(default)]
    pub order: Vec<String>,

    /// System IDs that start disabled when registered.
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl RuntimeConfig {
    /// Loads a configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parses a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Converts the configuration to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Checks values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid("tick_rate must be at least 1".to_string()));
        }
        if self.tick_rate > MAX_TICK_RATE {
            return Err(ConfigError::Invalid(format!(
                "tick_rate must be at most {}, got {}",
                MAX_TICK_RATE, self.tick_rate
            )));
        }
        Ok(())
    }

    /// Seconds per frame at the configured tick rate.
    pub fn frame_delta(&self) -> f64 {
        1.0 / f64::from(self.tick_rate.max(1))
    }

    /// IDs that appear more than once in the configured system order.
    pub fn duplicate_systems(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut duplicates = Vec::new();
        for id in &self.systems.order {
            if !seen.insert(id.as_str()) && !duplicates.contains(id) {
                duplicates.push(id.clone());
            }
        }
        duplicates
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_rate: default_tick_rate(),
            frames: 0,
            systems: SchedulerConfig::default(),
            extensions: Vec::new(),
        }
    }
}
