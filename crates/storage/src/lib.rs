//! Storage Layer
//!
//! Persists one `AlertRecord` per fingerprint. The `AlertStore` trait is the
//! contract the reconciler depends on; `MemoryAlertStore` and
//! `SqliteAlertStore` implement it.

mod memory;
mod record;
mod sqlite;
mod store;

pub use memory::MemoryAlertStore;
pub use record::{AlertFilter, AlertRecord, NewAlertRecord};
pub use sqlite::SqliteAlertStore;
pub use store::AlertStore;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found")]
    NotFound,
    #[error("Duplicate fingerprint: {0}")]
    DuplicateKey(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StorageError::SerializationError(err.to_string())
            }
            other => StorageError::DatabaseError(other.to_string()),
        }
    }
}
