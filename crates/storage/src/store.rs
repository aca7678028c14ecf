//! Alert store contract

use crate::record::{AlertFilter, AlertRecord, NewAlertRecord};
use crate::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Durable alert persistence keyed by fingerprint.
///
/// Implementations must enforce fingerprint uniqueness on `insert`, failing
/// with `StorageError::DuplicateKey` when the fingerprint is already present.
/// That constraint is what resolves concurrent first sightings of the same
/// alert.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Point lookup. `Ok(None)` when the fingerprint has never been stored.
    async fn find_by_fingerprint(&self, fingerprint: &str)
        -> Result<Option<AlertRecord>, StorageError>;

    /// Insert a new record and return its assigned id.
    async fn insert(&self, record: NewAlertRecord) -> Result<i64, StorageError>;

    /// Overwrite `status` and `ends_at` of an existing record, leaving every
    /// other field untouched.
    async fn update_status_and_ends_at(
        &self,
        id: i64,
        status: &str,
        ends_at: Option<DateTime<Utc>>,
    ) -> Result<(), StorageError>;

    /// Stored records matching the filter, newest first.
    async fn list(&self, filter: &AlertFilter) -> Result<Vec<AlertRecord>, StorageError>;

    /// Total number of stored records.
    async fn count(&self) -> Result<usize, StorageError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StorageError>;
}
