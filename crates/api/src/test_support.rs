//! Router fixtures over a mock Postgres connection.

use std::sync::Arc;

use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Transaction};
use serde_json::Value;
use uuid::Uuid;

use crate::{ApiSettings, AppState, Gateways, create_router};
use contentforge_db::entities::session;
use contentforge_shared::config::EmailConfig;
use contentforge_shared::{EmailService, JwtConfig, JwtService};

pub(crate) fn state_with(db: DatabaseConnection, gateways: Gateways) -> AppState {
    state_on(&Arc::new(db), gateways)
}

/// State over a connection the test keeps, so its query log can be read back.
pub(crate) fn state_on(db: &Arc<DatabaseConnection>, gateways: Gateways) -> AppState {
    AppState {
        db: Arc::clone(db),
        jwt_service: Arc::new(JwtService::new(JwtConfig::default())),
        email_service: Arc::new(EmailService::new(
            EmailConfig::default(),
            Default::default(),
        )),
        settings: Arc::new(ApiSettings::default()),
        gateways,
    }
}

pub(crate) fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

pub(crate) fn active_session(user_id: Uuid, session_id: Uuid) -> session::Model {
    let now = Utc::now().naive_utc();
    session::Model {
        id: session_id.to_string(),
        expires_at: now + Duration::days(1),
        token: "stored-token-hash".to_string(),
        created_at: now,
        updated_at: now,
        ip_address: None,
        user_agent: None,
        user_id,
    }
}

/// A database whose first query answers the auth middleware's session lookup.
pub(crate) fn signed_in_db(user_id: Uuid, session_id: Uuid) -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![active_session(user_id, session_id)]])
        .into_connection()
}

pub(crate) fn bearer(state: &AppState, user_id: Uuid, session_id: Uuid) -> String {
    bearer_as(state, user_id, session_id, "user")
}

pub(crate) fn bearer_as(state: &AppState, user_id: Uuid, session_id: Uuid, role: &str) -> String {
    let issued = state
        .jwt_service
        .generate_session_token(user_id, session_id, role, state.jwt_service.session_expiry())
        .expect("should generate token");
    format!("Bearer {}", issued.token)
}

pub(crate) fn app(state: AppState) -> Router {
    create_router(state)
}

pub(crate) async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

/// Every statement the mock database saw, in order.
pub(crate) fn queries(db: Arc<DatabaseConnection>) -> Vec<String> {
    let db = Arc::try_unwrap(db)
        .ok()
        .expect("router should have released the connection");
    db.into_transaction_log()
        .iter()
        .flat_map(Transaction::statements)
        .map(|stmt| stmt.sql.clone())
        .collect()
}
