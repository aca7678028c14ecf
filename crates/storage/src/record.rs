//! Persistent alert records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reconciled state of one alert, keyed by fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Store-assigned identity
    pub id: i64,
    pub fingerprint: String,
    pub status: String,
    /// JSON object, captured at first insert
    pub labels: String,
    /// JSON object, captured at first insert
    pub annotations: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Record content handed to `AlertStore::insert`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlertRecord {
    pub fingerprint: String,
    pub status: String,
    pub labels: String,
    pub annotations: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl NewAlertRecord {
    pub(crate) fn into_record(self, id: i64) -> AlertRecord {
        AlertRecord {
            id,
            fingerprint: self.fingerprint,
            status: self.status,
            labels: self.labels,
            annotations: self.annotations,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            created_at: self.created_at,
        }
    }
}

/// Filters for listing stored alerts
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    /// Only records whose current status matches
    pub status: Option<String>,
    /// Maximum number of records, newest first
    pub limit: usize,
}

impl AlertFilter {
    pub fn new(limit: usize) -> Self {
        Self { status: None, limit }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}
