//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - Error mapping to JSON responses
//! - Fire-and-forget email notifications

pub mod error;
pub mod middleware;
pub mod notify;
pub mod routes;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use contentforge_integrations::{
    ContentGenerator, MediaStorage, MpesaGateway, PesapalGateway, Transcriber,
};
use contentforge_shared::config::AppSettings;
use contentforge_shared::{AppError, EmailService, JwtService};

pub use error::{ApiError, ApiResult};

/// Deployment settings handlers need at request time.
#[derive(Debug, Clone, Default)]
pub struct ApiSettings {
    /// Public URL and product name.
    pub app: AppSettings,
    /// Registered Pesapal IPN id sent with every order.
    pub pesapal_ipn_id: String,
}

/// Provider clients. A `None` entry means the provider is not configured.
#[derive(Clone, Default)]
pub struct Gateways {
    /// M-Pesa Daraja.
    pub mpesa: Option<Arc<dyn MpesaGateway>>,
    /// Pesapal v3.
    pub pesapal: Option<Arc<dyn PesapalGateway>>,
    /// Claude.
    pub content: Option<Arc<dyn ContentGenerator>>,
    /// Deepgram.
    pub transcriber: Option<Arc<dyn Transcriber>>,
    /// ImageKit.
    pub storage: Option<Arc<dyn MediaStorage>>,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Email service for sending emails.
    pub email_service: Arc<EmailService>,
    /// Deployment settings.
    pub settings: Arc<ApiSettings>,
    /// Provider clients.
    pub gateways: Gateways,
}

fn unavailable(provider: &str) -> ApiError {
    AppError::ServiceUnavailable(format!("{provider} is not configured")).into()
}

impl AppState {
    /// The M-Pesa gateway, or 503.
    pub fn mpesa(&self) -> ApiResult<&Arc<dyn MpesaGateway>> {
        self.gateways.mpesa.as_ref().ok_or_else(|| unavailable("M-Pesa"))
    }

    /// The Pesapal gateway, or 503.
    pub fn pesapal(&self) -> ApiResult<&Arc<dyn PesapalGateway>> {
        self.gateways
            .pesapal
            .as_ref()
            .ok_or_else(|| unavailable("Pesapal"))
    }

    /// The content generator, or 503.
    pub fn content(&self) -> ApiResult<&Arc<dyn ContentGenerator>> {
        self.gateways
            .content
            .as_ref()
            .ok_or_else(|| unavailable("Content generation"))
    }

    /// The transcriber, or 503.
    pub fn transcriber(&self) -> ApiResult<&Arc<dyn Transcriber>> {
        self.gateways
            .transcriber
            .as_ref()
            .ok_or_else(|| unavailable("Transcription"))
    }

    /// Media storage, or 503.
    pub fn storage(&self) -> ApiResult<&Arc<dyn MediaStorage>> {
        self.gateways
            .storage
            .as_ref()
            .ok_or_else(|| unavailable("Media storage"))
    }

    /// A handle to the pool for repository constructors.
    #[must_use]
    pub fn conn(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.db)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
