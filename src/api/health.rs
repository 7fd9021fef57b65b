//! Liveness and readiness probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::api::types::Json;

use super::state::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reported instead of the driver message, which may name hosts and users
const STORAGE_UNAVAILABLE: &str = "Storage unavailable";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    /// Present on `/ready` only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageHealth>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of pinging the key repository
#[derive(Debug, Serialize)]
pub struct StorageHealth {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
}

impl StorageHealth {
    async fn probe(state: &AppState) -> Self {
        let started = Instant::now();
        let result = state.api_key_service.ping().await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(()) => Self {
                reachable: true,
                error: None,
                latency_ms,
            },
            Err(e) => {
                tracing::error!("Readiness probe failed: {}", e);
                Self {
                    reachable: false,
                    error: Some(STORAGE_UNAVAILABLE.to_string()),
                    latency_ms,
                }
            }
        }
    }
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        version: VERSION,
        storage: None,
    })
}

/// GET /ready - 503 while key storage is unreachable
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage = StorageHealth::probe(&state).await;

    let (code, status) = if storage.reachable {
        (StatusCode::OK, HealthStatus::Healthy)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, HealthStatus::Unhealthy)
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: VERSION,
            storage: Some(storage),
        }),
    )
}

/// GET /live
pub async fn live_check() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_liveness_body_omits_storage() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "1.0.0",
            storage: None,
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "status": "healthy", "version": "1.0.0" })
        );
    }

    #[test]
    fn test_unreachable_storage_body() {
        let response = HealthResponse {
            status: HealthStatus::Unhealthy,
            version: "1.0.0",
            storage: Some(StorageHealth {
                reachable: false,
                error: Some(STORAGE_UNAVAILABLE.to_string()),
                latency_ms: 3,
            }),
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "unhealthy");
        assert_eq!(value["storage"]["reachable"], false);
        assert_eq!(value["storage"]["error"], "Storage unavailable");
    }
}
