//! Alert Reconciliation
//!
//! Resolves incoming alert events against stored state: each event is
//! classified as new, updated or duplicate, persisted accordingly and
//! tallied through an `OutcomeReporter`.

mod engine;
mod error;
mod outcome;
mod reporter;

pub use engine::Reconciler;
pub use error::ReconcileError;
pub use outcome::{BatchCounts, BatchResult, EventOutcome, Outcome};
pub use reporter::{
    CountingReporter, MetricsReporter, NoopReporter, OutcomeReporter, ReporterSnapshot,
};
