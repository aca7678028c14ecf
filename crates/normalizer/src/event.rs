//! Canonical Alert Event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label or annotation set. Ordered so its JSON encoding is stable.
pub type LabelSet = BTreeMap<String, String>;

/// A validated alert notification, ready for reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Deduplication key, never empty
    pub fingerprint: String,
    /// Opaque status value ("firing", "resolved", ...)
    pub status: String,
    pub labels: LabelSet,
    pub annotations: LabelSet,
    pub starts_at: Option<DateTime<Utc>>,
    /// `None` while the alert is still open
    pub ends_at: Option<DateTime<Utc>>,
}

impl AlertEvent {
    /// Create an event with empty labels and no timestamps
    pub fn new(fingerprint: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            status: status.into(),
            labels: LabelSet::new(),
            annotations: LabelSet::new(),
            starts_at: None,
            ends_at: None,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn starting_at(mut self, at: DateTime<Utc>) -> Self {
        self.starts_at = Some(at);
        self
    }

    pub fn ending_at(mut self, at: DateTime<Utc>) -> Self {
        self.ends_at = Some(at);
        self
    }
}
