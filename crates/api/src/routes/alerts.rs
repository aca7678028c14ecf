//! Alert Routes

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storage::{AlertFilter, AlertRecord};

use crate::error::ApiError;
use crate::SharedState;

const MAX_LIMIT: usize = 500;

/// Query parameters for alerts endpoint
#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    /// Filter by current status
    pub status: Option<String>,
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Stored alert as returned to consumers
#[derive(Debug, Serialize)]
pub struct AlertView {
    pub id: i64,
    pub fingerprint: String,
    pub status: String,
    pub labels: Value,
    pub annotations: Value,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

fn parse_json(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

impl From<AlertRecord> for AlertView {
    fn from(record: AlertRecord) -> Self {
        Self {
            id: record.id,
            fingerprint: record.fingerprint,
            status: record.status,
            labels: parse_json(record.labels),
            annotations: parse_json(record.annotations),
            starts_at: record.starts_at,
            ends_at: record.ends_at,
            created_at: record.created_at,
        }
    }
}

/// Response for alerts endpoint
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub data: Vec<AlertView>,
    pub count: usize,
}

/// List stored alerts, newest first
pub async fn list_alerts(
    State(state): State<SharedState>,
    Query(params): Query<AlertQuery>,
) -> Result<Json<AlertResponse>, ApiError> {
    let filter = AlertFilter {
        status: params.status,
        limit: params.limit.min(MAX_LIMIT),
    };

    let data: Vec<AlertView> = state
        .reconciler
        .store()
        .list(&filter)
        .await?
        .into_iter()
        .map(AlertView::from)
        .collect();

    Ok(Json(AlertResponse {
        count: data.len(),
        data,
    }))
}

/// Get one alert by fingerprint
pub async fn get_alert(
    State(state): State<SharedState>,
    Path(fingerprint): Path<String>,
) -> Result<Json<AlertView>, ApiError> {
    state
        .reconciler
        .store()
        .find_by_fingerprint(&fingerprint)
        .await?
        .map(|record| Json(record.into()))
        .ok_or(ApiError::NotFound)
}
