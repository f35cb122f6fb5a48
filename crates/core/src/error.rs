//! Error types for Tessera.

use thiserror::Error;

use crate::capability::CapabilityKind;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Main error type for the core registries.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{kind} '{id}' not found")]
    CapabilityNotFound { kind: CapabilityKind, id: String },

    #[error("Service '{0}' not found")]
    ServiceNotFound(String),

    #[error("Service '{key}' is not a {expected}")]
    ServiceTypeMismatch { key: String, expected: &'static str },
}
