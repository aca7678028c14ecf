//! Alert Normalization
//!
//! Turns raw Alertmanager webhook alerts into validated `AlertEvent`s.

mod error;
mod event;
mod normalizer;
mod payload;

pub use error::ValidationError;
pub use event::{AlertEvent, LabelSet};
pub use normalizer::{normalize, normalize_batch, open_timestamp};
pub use payload::{RawAlert, WebhookPayload};
