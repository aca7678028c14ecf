//! Reconciliation Engine

use crate::error::ReconcileError;
use crate::outcome::{BatchResult, Outcome};
use crate::reporter::OutcomeReporter;
use chrono::Utc;
use normalizer::{normalize_batch, AlertEvent, RawAlert};
use std::sync::Arc;
use storage::{AlertRecord, AlertStore, NewAlertRecord, StorageError};
use tracing::{debug, info, warn};

/// Resolves alert events against the store, one fingerprint at a time.
///
/// Holds no record cache: every decision reads the store's current state.
/// Events of one batch are processed sequentially in input order; separate
/// batches may run concurrently against the same store.
pub struct Reconciler<S: ?Sized, R: ?Sized> {
    store: Arc<S>,
    reporter: Arc<R>,
}

impl<S: ?Sized, R: ?Sized> Clone for Reconciler<S, R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            reporter: Arc::clone(&self.reporter),
        }
    }
}

impl<S, R> Reconciler<S, R>
where
    S: AlertStore + ?Sized,
    R: OutcomeReporter + ?Sized,
{
    pub fn new(store: Arc<S>, reporter: Arc<R>) -> Self {
        Self { store, reporter }
    }

    /// Backing store, for read-side queries
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Reconcile already-normalized events
    pub async fn reconcile(&self, batch: &[AlertEvent]) -> BatchResult {
        self.reporter.increment_received(batch.len() as u64);

        let mut result = BatchResult::with_capacity(batch.len());
        for (index, event) in batch.iter().enumerate() {
            let outcome = self.reconcile_event(event).await;
            result.push(index, Some(event.fingerprint.clone()), outcome);
        }

        Self::log_batch(&result);
        result
    }

    /// Normalize and reconcile a raw webhook batch.
    ///
    /// Invalid events take an `Error` slot at their position; the remaining
    /// events are still reconciled.
    pub async fn ingest(&self, raws: Vec<RawAlert>) -> BatchResult {
        self.reporter.increment_received(raws.len() as u64);

        let fingerprints: Vec<Option<String>> =
            raws.iter().map(|raw| raw.fingerprint.clone()).collect();
        let mut result = BatchResult::with_capacity(raws.len());

        for (index, (normalized, fingerprint)) in
            normalize_batch(raws).into_iter().zip(fingerprints).enumerate()
        {
            let outcome = match normalized {
                Ok(event) => self.reconcile_event(&event).await,
                Err(err) => {
                    warn!("Rejected alert at position {}: {}", index, err);
                    self.fail(ReconcileError::Validation(err))
                }
            };
            result.push(index, fingerprint.filter(|fp| !fp.is_empty()), outcome);
        }

        Self::log_batch(&result);
        result
    }

    async fn reconcile_event(&self, event: &AlertEvent) -> Outcome {
        match self.resolve(event).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("Failed to reconcile alert {}: {}", event.fingerprint, err);
                self.fail(err)
            }
        }
    }

    fn fail(&self, err: ReconcileError) -> Outcome {
        self.reporter.increment_failed(err.kind());
        Outcome::Error(err)
    }

    async fn resolve(&self, event: &AlertEvent) -> Result<Outcome, ReconcileError> {
        match self.store.find_by_fingerprint(&event.fingerprint).await? {
            None => self.create(event).await,
            Some(existing) if existing.status != event.status => {
                self.transition(&existing, event).await
            }
            Some(_) => {
                debug!("Duplicate alert {} (status {})", event.fingerprint, event.status);
                self.reporter.increment_duplicate();
                Ok(Outcome::Duplicate)
            }
        }
    }

    async fn create(&self, event: &AlertEvent) -> Result<Outcome, ReconcileError> {
        let record = NewAlertRecord {
            fingerprint: event.fingerprint.clone(),
            status: event.status.clone(),
            labels: serde_json::to_string(&event.labels)?,
            annotations: serde_json::to_string(&event.annotations)?,
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            created_at: Utc::now(),
        };

        match self.store.insert(record).await {
            Ok(id) => {
                info!("New alert {} (id {}, status {})", event.fingerprint, id, event.status);
                self.reporter.increment_new();
                Ok(Outcome::New)
            }
            Err(StorageError::DuplicateKey(_)) => {
                // Another batch inserted this fingerprint after our lookup
                warn!("Insert race on alert {}, applying as update", event.fingerprint);
                let winner = self
                    .store
                    .find_by_fingerprint(&event.fingerprint)
                    .await?
                    .ok_or_else(|| ReconcileError::DuplicateKey(event.fingerprint.clone()))?;
                self.transition(&winner, event).await
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn transition(
        &self,
        existing: &AlertRecord,
        event: &AlertEvent,
    ) -> Result<Outcome, ReconcileError> {
        self.store
            .update_status_and_ends_at(existing.id, &event.status, event.ends_at)
            .await?;

        info!(
            "Alert {} transitioned {} -> {}",
            event.fingerprint, existing.status, event.status
        );
        self.reporter.increment_updated();
        Ok(Outcome::Updated)
    }

    fn log_batch(result: &BatchResult) {
        let c = &result.counts;
        debug!(
            "Batch reconciled: received={} new={} updated={} duplicate={} failed={}",
            c.received, c.new, c.updated, c.duplicate, c.failed
        );
    }
}
