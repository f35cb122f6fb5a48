//! Plugin error types.

use tessera_core::CoreError;
use thiserror::Error;

/// Error type for extension lifecycle operations.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The extension reference could not be turned into a descriptor.
    #[error("Failed to resolve extension reference")]
    ResolutionFailed,

    /// An extension with the same ID is already loaded.
    #[error("Extension '{0}' is already loaded")]
    AlreadyLoaded(String),

    /// The registration entry point failed; partial changes were rolled back.
    #[error("Extension '{id}' failed to register: {reason}")]
    RegistrationFailed { id: String, reason: String },

    /// No extension is loaded under the ID.
    #[error("Extension '{0}' is not loaded")]
    NotLoaded(String),

    /// An entry point panicked.
    #[error("Extension panicked: {0}")]
    Panicked(String),

    /// Error raised by extension code.
    #[error("{0}")]
    Extension(String),

    /// Core registry error.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl PluginError {
    /// Creates an error from extension code.
    pub fn extension(message: impl Into<String>) -> Self {
        PluginError::Extension(message.into())
    }
}

/// Result type for plugin operations.
pub type Result<T> = std::result::Result<T, PluginError>;
