//! Validation Error Types

use thiserror::Error;

/// Errors raised while normalizing an incoming alert
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Fingerprint present but blank
    #[error("Fingerprint must not be empty")]
    EmptyFingerprint,
}
