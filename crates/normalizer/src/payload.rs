//! Alertmanager Webhook Payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One alert as posted by Alertmanager. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAlert {
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub labels: Option<HashMap<String, String>>,
    #[serde(default)]
    pub annotations: Option<HashMap<String, String>>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "generatorURL")]
    pub generator_url: Option<String>,
}

/// Alertmanager notification envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub group_key: Option<String>,
    #[serde(default)]
    pub receiver: Option<String>,
    /// Group-level status, informational only
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub alerts: Vec<RawAlert>,
}

impl WebhookPayload {
    /// Hand over the alert list for batch processing
    pub fn into_alerts(self) -> Vec<RawAlert> {
        self.alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_alertmanager_payload() {
        let body = r#"{
            "version": "4",
            "groupKey": "{}:{alertname=\"HighLatency\"}",
            "receiver": "ledger",
            "status": "firing",
            "alerts": [{
                "status": "firing",
                "labels": {"alertname": "HighLatency", "severity": "page"},
                "annotations": {"summary": "p99 above 2s"},
                "startsAt": "2024-05-01T10:00:00Z",
                "endsAt": "0001-01-01T00:00:00Z",
                "generatorURL": "http://prometheus/graph",
                "fingerprint": "a1b2c3"
            }]
        }"#;

        let payload: WebhookPayload = serde_json::from_str(body).unwrap();
        assert_eq!(payload.receiver.as_deref(), Some("ledger"));

        let alerts = payload.into_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].fingerprint.as_deref(), Some("a1b2c3"));
        assert_eq!(alerts[0].labels.as_ref().unwrap()["severity"], "page");
        assert!(alerts[0].ends_at.is_some());
    }

    #[test]
    fn test_missing_fields_default() {
        let payload: WebhookPayload = serde_json::from_str(r#"{"alerts": [{}]}"#).unwrap();
        let alert = &payload.alerts[0];
        assert!(alert.fingerprint.is_none());
        assert!(alert.labels.is_none());
        assert!(alert.starts_at.is_none());
    }

    #[test]
    fn test_empty_envelope() {
        let payload: WebhookPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.into_alerts().is_empty());
    }
}
