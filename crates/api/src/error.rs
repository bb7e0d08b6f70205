//! API error type and its JSON rendering.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;
use validator::ValidationErrors;

use contentforge_core::auth::PasswordError;
use contentforge_db::{TeamError, TransactionError, UserError};
use contentforge_integrations::IntegrationError;
use contentforge_shared::{AppError, JwtError};

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Handler error. Renders as `{"error": <code>, "message": <text>}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 400 with a message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// 404 for a named resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self(AppError::NotFound(what.into()))
    }

    /// 403 with a message.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self(AppError::Forbidden(message.into()))
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Message shown to the client. Server-side failures are masked.
    #[must_use]
    pub fn public_message(&self) -> String {
        match &self.0 {
            AppError::NotFound(_) => self.0.to_string(),
            e if e.is_client_error() => e.detail().to_string(),
            AppError::ExternalService(_) => "The provider request failed".to_string(),
            _ => "An internal error occurred".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        let body = json!({
            "error": self.0.error_code(),
            "message": self.public_message(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        match e {
            DbErr::RecordNotFound(what) => Self(AppError::NotFound(what)),
            other => Self(AppError::Database(other.to_string())),
        }
    }
}

impl From<IntegrationError> for ApiError {
    fn from(e: IntegrationError) -> Self {
        match e {
            IntegrationError::InvalidInput(message) => Self(AppError::Validation(message)),
            other => Self(AppError::ExternalService(other.to_string())),
        }
    }
}

impl From<TransactionError> for ApiError {
    fn from(e: TransactionError) -> Self {
        match e {
            TransactionError::NotFound(id) => Self(AppError::NotFound(format!("Transaction {id}"))),
            TransactionError::Settlement(inner) => Self(AppError::BusinessRule(inner.to_string())),
            TransactionError::Database(inner) => inner.into(),
        }
    }
}

impl From<TeamError> for ApiError {
    fn from(e: TeamError) -> Self {
        match e {
            TeamError::NotFound(id) => Self(AppError::NotFound(format!("Team {id}"))),
            TeamError::AlreadyMember(id) => Self(AppError::Conflict(format!(
                "User {id} is already a member of this team"
            ))),
            TeamError::Database(inner) => inner.into(),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::EmailTaken => Self(AppError::Conflict(
                "An account with this email already exists".to_string(),
            )),
            UserError::Database(inner) => inner.into(),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        Self(AppError::Internal(e.to_string()))
    }
}

impl From<JwtError> for ApiError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::Expired => Self(AppError::Unauthorized("Token has expired".to_string())),
            JwtError::DecodingError(_) => {
                Self(AppError::Unauthorized("Invalid or malformed token".to_string()))
            }
            JwtError::EncodingError(m) => Self(AppError::Internal(m)),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self {
        Self(AppError::Validation(e.to_string()))
    }
}
