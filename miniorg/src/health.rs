//! Health check handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service name
    pub service: String,

    /// Version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Readiness check response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,

    pub service: String,

    /// Why the database is not usable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

/// Liveness probe
///
/// Always returns 200 OK while the process is serving requests.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: state.config().service.name.clone(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness probe
///
/// Returns 503 when the database cannot answer a trivial query.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let service = state.config().service.name.clone();

    match sqlx::query("SELECT 1").execute(state.db()).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                ready: true,
                service,
                database: None,
            }),
        ),
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    ready: false,
                    service,
                    database: Some(e.to_string()),
                }),
            )
        }
    }
}
