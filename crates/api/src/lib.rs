//! Alert Ledger API Server
//!
//! Receives Alertmanager webhooks, reconciles them into the alert store and
//! serves the stored state.

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use reconciler::{MetricsReporter, OutcomeReporter, Reconciler};
use std::sync::Arc;
use std::time::Instant;
use storage::{AlertStore, SqliteAlertStore};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
mod error;
pub mod routes;

pub use crate::config::{AppConfig, DatabaseConfig, LoggingConfig, ServerConfig};
pub use error::ApiError;

/// Reconciler over whichever store and reporter the process wires in
pub type DynReconciler = Reconciler<dyn AlertStore, dyn OutcomeReporter>;

/// Application state shared across handlers
pub struct AppState {
    pub reconciler: DynReconciler,
    /// Present when a Prometheus recorder is installed
    pub metrics: Option<PrometheusHandle>,
    pub version: String,
    pub start_time: Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        store: Arc<dyn AlertStore>,
        reporter: Arc<dyn OutcomeReporter>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            reconciler: Reconciler::new(store, reporter),
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/healthz", get(routes::health::healthz))
        .route("/metrics", get(routes::health::metrics))
        .route(
            "/api/v1/webhooks/alertmanager",
            post(routes::webhooks::receive_alertmanager),
        )
        .route("/api/v1/alerts", get(routes::alerts::list_alerts))
        .route("/api/v1/alerts/:fingerprint", get(routes::alerts::get_alert))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize logging
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}

/// Install the process-wide Prometheus recorder
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    MetricsReporter::describe();
    Ok(handle)
}

/// Run the server until Ctrl-C
pub async fn run_server(config: &AppConfig) -> anyhow::Result<()> {
    let metrics = init_metrics()?;
    let store = SqliteAlertStore::connect(&config.database.url, config.database.max_connections)
        .await?;

    let state = Arc::new(AppState::new(
        Arc::new(store),
        Arc::new(MetricsReporter),
        Some(metrics),
    ));
    let app = create_router(state);

    info!("Starting API server on {}", config.server.listen_addr);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use reconciler::CountingReporter;
    use serde_json::{json, Value};
    use storage::{AlertFilter, AlertRecord, MemoryAlertStore, NewAlertRecord, StorageError};
    use tower::ServiceExt;

    /// Memory store whose inserts always fail
    #[derive(Default)]
    struct BrokenInsertStore {
        inner: MemoryAlertStore,
    }

    #[async_trait]
    impl AlertStore for BrokenInsertStore {
        async fn find_by_fingerprint(
            &self,
            fingerprint: &str,
        ) -> Result<Option<AlertRecord>, StorageError> {
            self.inner.find_by_fingerprint(fingerprint).await
        }

        async fn insert(&self, _record: NewAlertRecord) -> Result<i64, StorageError> {
            Err(StorageError::DatabaseError("disk full".to_string()))
        }

        async fn update_status_and_ends_at(
            &self,
            id: i64,
            status: &str,
            ends_at: Option<DateTime<Utc>>,
        ) -> Result<(), StorageError> {
            self.inner.update_status_and_ends_at(id, status, ends_at).await
        }

        async fn list(&self, filter: &AlertFilter) -> Result<Vec<AlertRecord>, StorageError> {
            self.inner.list(filter).await
        }

        async fn count(&self) -> Result<usize, StorageError> {
            self.inner.count().await
        }

        async fn ping(&self) -> Result<(), StorageError> {
            self.inner.ping().await
        }
    }

    fn broken_insert_app() -> Router {
        let state = Arc::new(AppState::new(
            Arc::new(BrokenInsertStore::default()),
            Arc::new(CountingReporter::new()),
            None,
        ));
        create_router(state)
    }

    fn test_app() -> (Router, Arc<MemoryAlertStore>, Arc<CountingReporter>) {
        let store = Arc::new(MemoryAlertStore::new());
        let reporter = Arc::new(CountingReporter::new());
        let state = Arc::new(AppState::new(store.clone(), reporter.clone(), None));
        (create_router(state), store, reporter)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_webhook(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/webhooks/alertmanager")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn alert(fp: &str, status: &str) -> Value {
        json!({
            "status": status,
            "labels": {"alertname": "HighLatency", "severity": "page"},
            "annotations": {"summary": "p99 above 2s"},
            "startsAt": "2024-05-01T10:00:00Z",
            "endsAt": "0001-01-01T00:00:00Z",
            "fingerprint": fp
        })
    }

    #[tokio::test]
    async fn test_webhook_success() {
        let (app, store, reporter) = test_app();

        let (status, body) = send(&app, post_webhook(json!({"alerts": [alert("a1", "firing")]}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "alerts processed");
        assert_eq!(body["outcomes"][0]["outcome"], "new");
        assert_eq!(body["counts"]["new"], 1);

        let (status, body) = send(&app, post_webhook(json!({"alerts": [alert("a1", "firing")]}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcomes"][0]["outcome"], "duplicate");

        assert_eq!(store.len(), 1);
        assert_eq!(reporter.snapshot().received, 2);
    }

    #[tokio::test]
    async fn test_webhook_validation_failure_still_persists_others() {
        let (app, store, _) = test_app();

        let payload = json!({"alerts": [alert("a1", "firing"), alert("", "firing"), alert("a2", "firing")]});
        let (status, body) = send(&app, post_webhook(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["outcomes"][1]["outcome"], "error");
        assert_eq!(body["outcomes"][1]["kind"], "validation");
        assert_eq!(body["counts"]["failed"], 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_webhook_persistence_failure() {
        let app = broken_insert_app();

        let (status, body) = send(&app, post_webhook(json!({"alerts": [alert("a1", "firing")]}))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "failed to persist alerts");
        assert_eq!(body["outcomes"][0]["outcome"], "error");
        assert_eq!(body["outcomes"][0]["kind"], "persistence");
        assert_eq!(body["counts"]["failed"], 1);
    }

    #[tokio::test]
    async fn test_webhook_validation_outranks_persistence_failure() {
        let app = broken_insert_app();

        let payload = json!({"alerts": [alert("a1", "firing"), alert("", "firing")]});
        let (status, body) = send(&app, post_webhook(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["outcomes"][0]["kind"], "persistence");
        assert_eq!(body["outcomes"][1]["kind"], "validation");
        assert_eq!(body["counts"]["failed"], 2);
    }

    #[tokio::test]
    async fn test_webhook_malformed_body() {
        let (app, store, _) = test_app();

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/webhooks/alertmanager")
            .header("content-type", "application/json")
            .body(Body::from("{\"alerts\": [}"))
            .unwrap();
        let (status, body) = send(&app, request).await;

        assert!(status.is_client_error());
        assert!(body["error"].is_string());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_query_alerts() {
        let (app, _, _) = test_app();
        send(&app, post_webhook(json!({"alerts": [alert("a1", "firing"), alert("a2", "firing")]}))).await;
        send(&app, post_webhook(json!({"alerts": [alert("a1", "resolved")]}))).await;

        let (status, body) = send(&app, get("/api/v1/alerts?status=firing")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["fingerprint"], "a2");

        let (status, body) = send(&app, get("/api/v1/alerts/a1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "resolved");
        assert_eq!(body["labels"]["alertname"], "HighLatency");
        assert!(body["ends_at"].is_null());

        let (status, _) = send(&app, get("/api/v1/alerts/unknown")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_healthz() {
        let (app, _, _) = test_app();
        let (status, body) = send(&app, get("/healthz")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["alert_count"], 0);
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let (app, _, _) = test_app();
        let response = app.oneshot(get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
