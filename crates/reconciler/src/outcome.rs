//! Per-event outcomes and batch results

use crate::error::ReconcileError;
use serde::Serialize;

/// Classification of one reconciled event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// First sighting; a record was inserted
    New,
    /// Status changed; `status` and `ends_at` were written
    Updated,
    /// Same status as stored; nothing written
    Duplicate,
    /// Event skipped
    Error(ReconcileError),
}

impl Outcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }

    pub fn error(&self) -> Option<&ReconcileError> {
        match self {
            Outcome::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// Outcome of the event at `index` in the submitted batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventOutcome {
    pub index: usize,
    /// Absent when the event was rejected before a fingerprint was known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Aggregate counts over one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchCounts {
    pub received: usize,
    pub new: usize,
    pub updated: usize,
    pub duplicate: usize,
    pub failed: usize,
}

/// Ordered per-event outcomes plus totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub outcomes: Vec<EventOutcome>,
    pub counts: BatchCounts,
}

impl BatchResult {
    pub(crate) fn with_capacity(received: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(received),
            counts: BatchCounts {
                received,
                ..Default::default()
            },
        }
    }

    pub(crate) fn push(&mut self, index: usize, fingerprint: Option<String>, outcome: Outcome) {
        match &outcome {
            Outcome::New => self.counts.new += 1,
            Outcome::Updated => self.counts.updated += 1,
            Outcome::Duplicate => self.counts.duplicate += 1,
            Outcome::Error(_) => self.counts.failed += 1,
        }
        self.outcomes.push(EventOutcome {
            index,
            fingerprint,
            outcome,
        });
    }

    /// True when no event failed
    pub fn is_success(&self) -> bool {
        self.counts.failed == 0
    }

    pub fn has_validation_errors(&self) -> bool {
        self.errors().any(ReconcileError::is_validation)
    }

    /// Any failure other than a validation failure
    #[cfg(test)]
    pub(crate) fn has_persistence_errors(&self) -> bool {
        self.errors().any(|e| !e.is_validation())
    }

    /// Errors in batch order
    pub fn errors(&self) -> impl Iterator<Item = &ReconcileError> {
        self.outcomes.iter().filter_map(|o| o.outcome.error())
    }

    /// Bare outcomes in batch order
    #[cfg(test)]
    pub(crate) fn kinds(&self) -> Vec<&Outcome> {
        self.outcomes.iter().map(|o| &o.outcome).collect()
    }
}
