//! In-memory alert store

use crate::record::{AlertFilter, AlertRecord, NewAlertRecord};
use crate::store::AlertStore;
use crate::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Default)]
struct Tables {
    /// Records by id
    records: HashMap<i64, AlertRecord>,
    /// Unique index on fingerprint
    by_fingerprint: HashMap<String, i64>,
    next_id: i64,
}

/// Alert store kept entirely in process memory.
///
/// The fingerprint check and the insert happen under one lock, so the
/// uniqueness guarantee holds across concurrent callers.
pub struct MemoryAlertStore {
    tables: Mutex<Tables>,
}

impl MemoryAlertStore {
    /// Create an empty store
    pub fn new() -> Self {
        info!("Creating in-memory alert store");
        Self {
            tables: Mutex::new(Tables {
                next_id: 1,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.tables.lock().map(|t| t.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryAlertStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<AlertRecord>, StorageError> {
        let tables = self.lock()?;
        Ok(tables
            .by_fingerprint
            .get(fingerprint)
            .and_then(|id| tables.records.get(id))
            .cloned())
    }

    async fn insert(&self, record: NewAlertRecord) -> Result<i64, StorageError> {
        let mut tables = self.lock()?;

        if tables.by_fingerprint.contains_key(&record.fingerprint) {
            return Err(StorageError::DuplicateKey(record.fingerprint));
        }

        let id = tables.next_id;
        tables.next_id += 1;
        tables.by_fingerprint.insert(record.fingerprint.clone(), id);
        tables.records.insert(id, record.into_record(id));

        debug!("Inserted alert record with ID {}", id);
        Ok(id)
    }

    async fn update_status_and_ends_at(
        &self,
        id: i64,
        status: &str,
        ends_at: Option<DateTime<Utc>>,
    ) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        let record = tables.records.get_mut(&id).ok_or(StorageError::NotFound)?;

        record.status = status.to_string();
        record.ends_at = ends_at;
        Ok(())
    }

    async fn list(&self, filter: &AlertFilter) -> Result<Vec<AlertRecord>, StorageError> {
        let tables = self.lock()?;

        let mut records: Vec<_> = tables
            .records
            .values()
            .filter(|r| filter.status.as_deref().map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.id.cmp(&a.id));
        records.truncate(filter.limit);

        Ok(records)
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.records.len())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.lock().map(|_| ())
    }
}
