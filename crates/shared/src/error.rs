//! The error type every layer converts into before it reaches a client.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Failure categories with a fixed HTTP status and wire code each.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, invalid or revoked credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Signed in but not allowed, e.g. an unverified email or a non-admin.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// No such row, or not owned by the caller.
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed request input.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Well-formed but not allowed in the current state, such as refunding
    /// an unpaid transaction.
    #[error("Not allowed: {0}")]
    BusinessRule(String),

    /// Duplicate email or team membership.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Query or connection failure.
    #[error("Database failure: {0}")]
    Database(String),

    /// M-Pesa, Pesapal, Claude, Deepgram or ImageKit rejected the call.
    #[error("Provider failure: {0}")]
    ExternalService(String),

    /// The provider behind a route has no credentials on this deployment.
    #[error("Unavailable: {0}")]
    ServiceUnavailable(String),

    /// Anything else.
    #[error("Internal failure: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::BusinessRule(_) => 422,
            Self::Database(_) | Self::ExternalService(_) | Self::Internal(_) => 500,
            Self::ServiceUnavailable(_) => 503,
        }
    }

    /// Stable machine-readable code sent as `error`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Database(_) => "DATABASE_ERROR",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The wrapped detail without the category prefix.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Validation(m)
            | Self::BusinessRule(m)
            | Self::Conflict(m)
            | Self::Database(m)
            | Self::ExternalService(m)
            | Self::ServiceUnavailable(m)
            | Self::Internal(m) => m,
        }
    }

    /// Whether the detail may be shown to the caller. Provider, database and
    /// internal details stay in the logs.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status_code() < 500 || matches!(self, Self::ServiceUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Validation("bad phone".into()), 400, "VALIDATION_ERROR", true)]
    #[case(AppError::Unauthorized("no token".into()), 401, "UNAUTHORIZED", true)]
    #[case(AppError::Forbidden("admin only".into()), 403, "FORBIDDEN", true)]
    #[case(AppError::NotFound("Project".into()), 404, "NOT_FOUND", true)]
    #[case(AppError::Conflict("email taken".into()), 409, "CONFLICT", true)]
    #[case(AppError::BusinessRule("not paid".into()), 422, "BUSINESS_RULE_VIOLATION", true)]
    #[case(AppError::Database("timeout".into()), 500, "DATABASE_ERROR", false)]
    #[case(AppError::ExternalService("Daraja 500".into()), 500, "EXTERNAL_SERVICE_ERROR", false)]
    #[case(AppError::ServiceUnavailable("M-Pesa".into()), 503, "SERVICE_UNAVAILABLE", true)]
    #[case(AppError::Internal("boom".into()), 500, "INTERNAL_ERROR", false)]
    fn test_error_mapping(
        #[case] error: AppError,
        #[case] status: u16,
        #[case] code: &str,
        #[case] client: bool,
    ) {
        assert_eq!(error.status_code(), status);
        assert_eq!(error.error_code(), code);
        assert_eq!(error.is_client_error(), client);
    }

    #[test]
    fn test_display_and_detail() {
        let error = AppError::NotFound("Brand".into());
        assert_eq!(error.to_string(), "Brand not found");
        assert_eq!(error.detail(), "Brand");

        let error = AppError::ServiceUnavailable("Pesapal is not configured".into());
        assert_eq!(error.to_string(), "Unavailable: Pesapal is not configured");
        assert_eq!(error.detail(), "Pesapal is not configured");
    }
}
