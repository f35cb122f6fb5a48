//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for engine configuration.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Error type for loading runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
