//! Outcome reporting
//!
//! The engine calls a reporter once per classified event, after the store
//! step for that event has completed. Reporters are infallible and must not
//! block.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

pub const RECEIVED_TOTAL: &str = "irm_webhooks_alertmanager_total";
pub const NEW_TOTAL: &str = "irm_webhooks_alertmanager_new_total";
pub const DUPLICATE_TOTAL: &str = "irm_webhooks_alertmanager_duplicate_total";
pub const UPDATED_TOTAL: &str = "irm_webhooks_alertmanager_updated_total";
pub const FAILED_TOTAL: &str = "irm_webhooks_alertmanager_failed_total";

/// Sink for reconciliation counters.
///
/// Default implementations are no-ops, so test doubles only implement what
/// they observe.
pub trait OutcomeReporter: Send + Sync {
    /// Alerts received, counted before normalization
    fn increment_received(&self, _n: u64) {}

    fn increment_new(&self) {}

    fn increment_duplicate(&self) {}

    fn increment_updated(&self) {}

    /// Event that ended in an error outcome, labelled by error kind
    fn increment_failed(&self, _kind: &'static str) {}
}

/// Reporter that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl OutcomeReporter for NoopReporter {}

/// Reporter backed by the `metrics` facade. Whatever recorder the process
/// installs (Prometheus in the server) receives the counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsReporter;

impl MetricsReporter {
    /// Register help texts with the installed recorder
    pub fn describe() {
        metrics::describe_counter!(RECEIVED_TOTAL, "Total number of received webhooks");
        metrics::describe_counter!(
            NEW_TOTAL,
            "Total number of new unique webhook inserted into the database"
        );
        metrics::describe_counter!(
            DUPLICATE_TOTAL,
            "Total number of duplicate webhooks (already exists in DB)"
        );
        metrics::describe_counter!(UPDATED_TOTAL, "Total number of webhooks that were updated");
        metrics::describe_counter!(
            FAILED_TOTAL,
            "Total number of webhook alerts that could not be reconciled"
        );
    }
}

impl OutcomeReporter for MetricsReporter {
    fn increment_received(&self, n: u64) {
        metrics::counter!(RECEIVED_TOTAL).increment(n);
    }

    fn increment_new(&self) {
        metrics::counter!(NEW_TOTAL).increment(1);
    }

    fn increment_duplicate(&self) {
        metrics::counter!(DUPLICATE_TOTAL).increment(1);
    }

    fn increment_updated(&self) {
        metrics::counter!(UPDATED_TOTAL).increment(1);
    }

    fn increment_failed(&self, kind: &'static str) {
        metrics::counter!(FAILED_TOTAL, "kind" => kind).increment(1);
    }
}

/// Point-in-time copy of a `CountingReporter`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReporterSnapshot {
    pub received: u64,
    pub new: u64,
    pub duplicate: u64,
    pub updated: u64,
    pub failed: u64,
}

/// In-process atomic counters
#[derive(Debug, Default)]
pub struct CountingReporter {
    received: AtomicU64,
    new: AtomicU64,
    duplicate: AtomicU64,
    updated: AtomicU64,
    failed: AtomicU64,
}

impl CountingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ReporterSnapshot {
        ReporterSnapshot {
            received: self.received.load(Ordering::Relaxed),
            new: self.new.load(Ordering::Relaxed),
            duplicate: self.duplicate.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl OutcomeReporter for CountingReporter {
    fn increment_received(&self, n: u64) {
        self.received.fetch_add(n, Ordering::Relaxed);
    }

    fn increment_new(&self) {
        self.new.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_duplicate(&self) {
        self.duplicate.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_updated(&self) {
        self.updated.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_failed(&self, _kind: &'static str) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}
