//! Reconciliation Error Types

use normalizer::ValidationError;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use storage::StorageError;
use thiserror::Error;

/// Per-event failure. Never fatal to the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// Incoming event was malformed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Store lookup, insert or update failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Labels or annotations could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Insert lost a race and the winning record could not be read back
    #[error("Duplicate fingerprint: {0}")]
    DuplicateKey(String),
}

impl ReconcileError {
    /// Short label for metrics and responses
    pub fn kind(&self) -> &'static str {
        match self {
            ReconcileError::Validation(_) => "validation",
            ReconcileError::Persistence(_) => "persistence",
            ReconcileError::Serialization(_) => "serialization",
            ReconcileError::DuplicateKey(_) => "duplicate_key",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ReconcileError::Validation(_))
    }
}

impl From<StorageError> for ReconcileError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DuplicateKey(fingerprint) => ReconcileError::DuplicateKey(fingerprint),
            StorageError::SerializationError(msg) => ReconcileError::Serialization(msg),
            other => ReconcileError::Persistence(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ReconcileError {
    fn from(err: serde_json::Error) -> Self {
        ReconcileError::Serialization(err.to_string())
    }
}

impl Serialize for ReconcileError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ReconcileError", 2)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_mapping() {
        let err: ReconcileError = StorageError::DuplicateKey("a1".to_string()).into();
        assert_eq!(err, ReconcileError::DuplicateKey("a1".to_string()));

        let err: ReconcileError = StorageError::DatabaseError("disk I/O error".to_string()).into();
        assert_eq!(err.kind(), "persistence");
        assert!(err.to_string().contains("disk I/O error"));
    }

    #[test]
    fn test_serialized_shape() {
        let err = ReconcileError::Validation(ValidationError::EmptyFingerprint);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "validation");
        assert_eq!(json["message"], "Validation error: Fingerprint must not be empty");
    }
}
