//! Alertmanager webhook receiver

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use normalizer::WebhookPayload;
use reconciler::BatchResult;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ErrorBody;
use crate::SharedState;

/// Response for the webhook endpoint
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub result: BatchResult,
}

/// Status code for a processed batch: any rejected event means 400, any
/// other failure 500.
pub fn status_for(result: &BatchResult) -> (StatusCode, &'static str) {
    if result.is_success() {
        (StatusCode::OK, "alerts processed")
    } else if result.has_validation_errors() {
        (StatusCode::BAD_REQUEST, "invalid alerts in batch")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "failed to persist alerts")
    }
}

/// Receive one Alertmanager notification
pub async fn receive_alertmanager(
    State(state): State<SharedState>,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected webhook body: {}", rejection.body_text());
            return (rejection.status(), ErrorBody::new(rejection.body_text())).into_response();
        }
    };

    debug!(
        "Webhook from receiver {:?} (group {:?}) with {} alerts",
        payload.receiver,
        payload.group_key,
        payload.alerts.len()
    );

    let result = state.reconciler.ingest(payload.into_alerts()).await;
    let (code, status) = status_for(&result);

    (code, Json(WebhookResponse { status, result })).into_response()
}
