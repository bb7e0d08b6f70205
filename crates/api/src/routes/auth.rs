//! Authentication routes: registration, email verification, login, password reset.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::USER_AGENT},
    routing::{get, post},
};
use chrono::Duration;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, ApiError, ApiResult, middleware::AuthUser, notify};
use contentforge_core::auth::{
    PASSWORD_RESET_TOKEN_TTL_HOURS, UserRole, VERIFICATION_TOKEN_TTL_HOURS, generate_token,
    hash_password, verify_password,
};
use contentforge_db::{
    AccountRepository, SessionContext, SessionRepository, UserRepository, VerificationPurpose,
    VerificationRepository, entities::user,
};
use contentforge_shared::AppError;
use contentforge_shared::auth::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest,
    UserInfo, VerifyEmailRequest,
};

/// Creates the public auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/verify-email", post(verify_email))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

/// Routes that need a signed-in user.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
}

/// Plain acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: &'static str,
}

/// Registration result.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// The new, unverified user.
    pub user: UserInfo,
    /// Next step for the client.
    pub message: &'static str,
}

fn user_info(model: &user::Model) -> UserInfo {
    UserInfo {
        id: model.id,
        name: model.name.clone(),
        email: model.email.clone(),
        email_verified: model.email_verified,
        role: UserRole::from(model.role).as_str().to_string(),
    }
}

fn session_context(headers: &HeaderMap) -> SessionContext {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    SessionContext {
        user_agent: header(USER_AGENT.as_str()),
        ip_address: header("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
            .or_else(|| header("x-real-ip")),
    }
}

fn invalid_credentials() -> ApiError {
    ApiError(AppError::Unauthorized("Invalid email or password".to_string()))
}

/// POST /auth/register - Create an account and send the verification email.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    payload.validate()?;

    let users = UserRepository::new(state.conn());
    if users.email_exists(&payload.email).await? {
        return Err(ApiError(AppError::Conflict(
            "An account with this email already exists".to_string(),
        )));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = users
        .create_with_credential(&payload.name, &payload.email, &password_hash)
        .await?;

    let token = VerificationRepository::new(state.conn())
        .issue(
            VerificationPurpose::EmailVerification,
            user.id,
            Duration::hours(VERIFICATION_TOKEN_TTL_HOURS),
        )
        .await?;

    notify::verification(
        &state.email_service,
        user.email.clone(),
        user.name.clone(),
        token,
    );

    info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user_info(&user),
            message: "Check your email to verify your account",
        }),
    ))
}

/// POST /auth/verify-email - Consume a verification token.
async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> ApiResult<Json<UserInfo>> {
    payload.validate()?;

    let user_id = VerificationRepository::new(state.conn())
        .consume(VerificationPurpose::EmailVerification, &payload.token)
        .await?
        .ok_or_else(|| ApiError::validation("Invalid or expired verification token"))?;

    let user = UserRepository::new(state.conn())
        .mark_email_verified(user_id)
        .await?;

    notify::welcome(&state.email_service, user.email.clone(), user.name.clone());
    info!(user_id = %user.id, "Email verified");

    Ok(Json(user_info(&user)))
}

/// POST /auth/login - Authenticate and open a session.
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    payload.validate()?;

    let Some(user) = UserRepository::new(state.conn())
        .find_by_email(&payload.email)
        .await?
    else {
        info!("Login attempt for unknown email");
        return Err(invalid_credentials());
    };

    let password_hash = AccountRepository::new(state.conn())
        .find_credential(user.id)
        .await?
        .and_then(|account| account.password)
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&payload.password, &password_hash)? {
        info!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(invalid_credentials());
    }

    if !user.email_verified {
        return Err(ApiError::forbidden(
            "Please verify your email address before signing in",
        ));
    }

    let session_id = Uuid::new_v4();
    let expires_at = state.jwt_service.session_expiry();
    let role = UserRole::from(user.role);
    let issued =
        state
            .jwt_service
            .generate_session_token(user.id, session_id, role.as_str(), expires_at)?;

    SessionRepository::new(state.conn())
        .create(
            session_id,
            user.id,
            &generate_token(),
            issued.expires_at,
            session_context(&headers),
        )
        .await?;

    info!(user_id = %user.id, %session_id, "User logged in");

    Ok(Json(LoginResponse {
        user: user_info(&user),
        access_token: issued.token,
        expires_in: state.jwt_service.session_expires_in(),
    }))
}

/// POST /auth/forgot-password - Always succeeds so accounts cannot be probed.
async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    payload.validate()?;

    if let Some(user) = UserRepository::new(state.conn())
        .find_by_email(&payload.email)
        .await?
    {
        let token = VerificationRepository::new(state.conn())
            .issue(
                VerificationPurpose::PasswordReset,
                user.id,
                Duration::hours(PASSWORD_RESET_TOKEN_TTL_HOURS),
            )
            .await?;
        notify::password_reset(&state.email_service, user.email, user.name, token);
        info!(user_id = %user.id, "Password reset requested");
    }

    Ok(Json(MessageResponse {
        message: "If an account exists for that email, a reset link has been sent",
    }))
}

/// POST /auth/reset-password - Set a new password and revoke all sessions.
async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    payload.validate()?;

    let user_id = VerificationRepository::new(state.conn())
        .consume(VerificationPurpose::PasswordReset, &payload.token)
        .await?
        .ok_or_else(|| ApiError::validation("Invalid or expired reset token"))?;

    let password_hash = hash_password(&payload.password)?;
    let updated = AccountRepository::new(state.conn())
        .reset_password(user_id, &password_hash)
        .await?;

    if !updated {
        return Err(ApiError::validation(
            "This account does not use password sign-in",
        ));
    }

    Ok(Json(MessageResponse {
        message: "Password updated. Please sign in again",
    }))
}

/// GET /auth/me - The signed-in user.
async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<UserInfo>> {
    let user = UserRepository::new(state.conn())
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(user_info(&user)))
}

/// POST /auth/logout - Revoke the current session.
async fn logout(State(state): State<AppState>, auth: AuthUser) -> ApiResult<StatusCode> {
    SessionRepository::new(state.conn())
        .revoke(auth.session_id())
        .await?;

    info!(user_id = %auth.user_id(), session_id = %auth.session_id(), "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_context_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.5"));
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("41.90.1.2, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));

        let ctx = session_context(&headers);
        assert_eq!(ctx.user_agent.as_deref(), Some("curl/8.5"));
        assert_eq!(ctx.ip_address.as_deref(), Some("41.90.1.2"));
    }

    #[test]
    fn test_session_context_empty() {
        let ctx = session_context(&HeaderMap::new());
        assert!(ctx.user_agent.is_none());
        assert!(ctx.ip_address.is_none());
    }
}
