//! Health and readiness endpoints.
//!
//! # Health vs Readiness
//!
//! - **Health** (`/v1/health`): Returns 200 while the process is serving
//! - **Readiness** (`/v1/ready`): Returns 503 unless the dataset loads and
//!   holds at least one quote

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use tracing::{instrument, warn};

use super::quotes::blocking;
use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint.
///
/// # Response Body
///
/// ```json
/// {
///   "status": "ok",
///   "version": "0.1.0",
///   "uptime_seconds": 42,
///   "timestamp": "2024-01-15T10:30:00Z"
/// }
/// ```
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        timestamp: Utc::now(),
    })
}

/// Readiness check endpoint for Kubernetes probes.
///
/// ```yaml
/// readinessProbe:
///   httpGet:
///     path: /v1/ready
///     port: 8080
/// ```
#[instrument(skip(state))]
pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    let quotes = state.quotes.clone();
    match blocking(move || quotes.dataset_size()).await {
        Ok(size) if size > 0 => Ok(StatusCode::OK),
        Ok(_) => {
            warn!("Readiness check failed: quotes dataset is empty");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
        Err(e) => {
            warn!(error = %e, "Readiness check failed: quotes dataset unavailable");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
