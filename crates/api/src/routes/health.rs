//! Health and metrics routes

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::warn;

use crate::SharedState;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

/// Health check: healthy only while the store answers
pub async fn healthz(State(state): State<SharedState>) -> impl IntoResponse {
    let store = state.reconciler.store();
    let uptime_seconds = state.start_time.elapsed().as_secs();

    let reachable = match store.ping().await {
        Ok(()) => store.count().await.ok(),
        Err(err) => {
            warn!("Health check failed: {}", err);
            None
        }
    };

    match reachable {
        Some(count) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                version: state.version.clone(),
                uptime_seconds,
                alert_count: Some(count),
                error: None,
            }),
        ),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthResponse {
                status: "unhealthy",
                version: state.version.clone(),
                uptime_seconds,
                alert_count: None,
                error: Some("database unreachable"),
            }),
        ),
    }
}

/// Prometheus exposition
pub async fn metrics(State(state): State<SharedState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}
