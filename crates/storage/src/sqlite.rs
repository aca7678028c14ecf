//! SQLite alert store

use crate::record::{AlertFilter, AlertRecord, NewAlertRecord};
use crate::store::AlertStore;
use crate::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS alerts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    fingerprint TEXT NOT NULL UNIQUE,
    status      TEXT NOT NULL,
    labels      TEXT NOT NULL,
    annotations TEXT NOT NULL,
    starts_at   TEXT,
    ends_at     TEXT,
    created_at  TEXT NOT NULL
)";

const COLUMNS: &str =
    "id, fingerprint, status, labels, annotations, starts_at, ends_at, created_at";

/// Alert store backed by a SQLite database through a sqlx pool
#[derive(Clone)]
pub struct SqliteAlertStore {
    pool: SqlitePool,
}

impl SqliteAlertStore {
    /// Open (creating if missing) the database at `url` and ensure the schema
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        info!("Connected to SQLite alert store at {}", url);
        Self::with_pool(pool).await
    }

    /// Private in-memory database. Pinned to a single connection that is never
    /// recycled, since every SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::with_pool(pool).await
    }

    /// Wrap an existing pool, creating the `alerts` table if needed
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    fn map_row(row: &SqliteRow) -> Result<AlertRecord, sqlx::Error> {
        Ok(AlertRecord {
            id: row.try_get("id")?,
            fingerprint: row.try_get("fingerprint")?,
            status: row.try_get("status")?,
            labels: row.try_get("labels")?,
            annotations: row.try_get("annotations")?,
            starts_at: row.try_get("starts_at")?,
            ends_at: row.try_get("ends_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl AlertStore for SqliteAlertStore {
    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<AlertRecord>, StorageError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM alerts WHERE fingerprint = ?1"))
            .bind(fingerprint)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::map_row).transpose().map_err(Into::into)
    }

    async fn insert(&self, record: NewAlertRecord) -> Result<i64, StorageError> {
        let result = sqlx::query(
            "INSERT INTO alerts (fingerprint, status, labels, annotations, starts_at, ends_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&record.fingerprint)
        .bind(&record.status)
        .bind(&record.labels)
        .bind(&record.annotations)
        .bind(record.starts_at)
        .bind(record.ends_at)
        .bind(record.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let id = done.last_insert_rowid();
                debug!("Inserted alert record with ID {}", id);
                Ok(id)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StorageError::DuplicateKey(record.fingerprint))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_status_and_ends_at(
        &self,
        id: i64,
        status: &str,
        ends_at: Option<DateTime<Utc>>,
    ) -> Result<(), StorageError> {
        let done = sqlx::query("UPDATE alerts SET status = ?1, ends_at = ?2 WHERE id = ?3")
            .bind(status)
            .bind(ends_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if done.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list(&self, filter: &AlertFilter) -> Result<Vec<AlertRecord>, StorageError> {
        let limit = i64::try_from(filter.limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM alerts
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY id DESC
             LIMIT ?2"
        ))
        .bind(filter.status.as_deref())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(Self::map_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    async fn count(&self) -> Result<usize, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alerts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
