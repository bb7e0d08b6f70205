//! Liveness and readiness probes.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;

use crate::AppState;

/// Liveness body.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `healthy` when the process answers.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Which providers this deployment has credentials for.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ProviderFlags {
    /// M-Pesa Daraja.
    pub mpesa: bool,
    /// Pesapal.
    pub pesapal: bool,
    /// Claude.
    pub content: bool,
    /// Deepgram.
    pub transcription: bool,
    /// ImageKit.
    pub storage: bool,
}

/// Readiness body.
#[derive(Serialize)]
pub struct ReadinessResponse {
    /// `ready` or `degraded`.
    pub status: &'static str,
    /// Whether the database answered a ping.
    pub database: bool,
    /// Configured providers.
    pub providers: ProviderFlags,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /health/ready. 503 when the database is unreachable.
async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let database = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Database ping failed");
            false
        }
    };

    let gateways = &state.gateways;
    let providers = ProviderFlags {
        mpesa: gateways.mpesa.is_some(),
        pesapal: gateways.pesapal.is_some(),
        content: gateways.content.is_some(),
        transcription: gateways.transcriber.is_some(),
        storage: gateways.storage.is_some(),
    };

    let (code, status) = if database {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(ReadinessResponse {
            status,
            database,
            providers,
        }),
    )
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness))
}
