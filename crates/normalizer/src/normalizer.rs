//! Raw alert normalization

use crate::error::ValidationError;
use crate::event::{AlertEvent, LabelSet};
use crate::payload::RawAlert;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Unix seconds of `0001-01-01T00:00:00Z`, Alertmanager's encoding of "unset"
const ZERO_TIME_SECS: i64 = -62_135_596_800;

/// Map Alertmanager's zero time (or anything earlier) to `None`
pub fn open_timestamp(ts: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    ts.filter(|t| t.timestamp() > ZERO_TIME_SECS)
}

fn into_label_set(map: Option<HashMap<String, String>>) -> LabelSet {
    map.map(|m| m.into_iter().collect()).unwrap_or_default()
}

/// Validate one raw alert and convert it into an `AlertEvent`
pub fn normalize(raw: RawAlert) -> Result<AlertEvent, ValidationError> {
    let fingerprint = raw
        .fingerprint
        .ok_or(ValidationError::MissingField("fingerprint"))?;

    if fingerprint.trim().is_empty() {
        return Err(ValidationError::EmptyFingerprint);
    }

    Ok(AlertEvent {
        fingerprint,
        status: raw.status.unwrap_or_default(),
        labels: into_label_set(raw.labels),
        annotations: into_label_set(raw.annotations),
        starts_at: open_timestamp(raw.starts_at),
        ends_at: open_timestamp(raw.ends_at),
    })
}

/// Normalize every alert independently, preserving input order
pub fn normalize_batch(raws: Vec<RawAlert>) -> Vec<Result<AlertEvent, ValidationError>> {
    raws.into_iter()
        .enumerate()
        .map(|(index, raw)| {
            normalize(raw).map_err(|e| {
                debug!("Alert at position {} rejected: {}", index, e);
                e
            })
        })
        .collect()
}
