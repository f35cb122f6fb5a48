//! Tessera Engine - Per-tick execution scheduling for the Tessera runtime.

mod config;
mod error;
mod scheduler;

pub use config::{MAX_TICK_RATE, RuntimeConfig, SchedulerConfig};
pub use error::{ConfigError, Result};
pub use scheduler::Scheduler;
