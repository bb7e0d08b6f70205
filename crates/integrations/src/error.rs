//! Provider client errors.

use thiserror::Error;

/// Errors returned by provider clients.
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// Fetching an OAuth token failed.
    #[error("Failed to authenticate with {provider}: {message}")]
    Auth {
        /// Provider name.
        provider: &'static str,
        /// Failure detail.
        message: String,
    },

    /// The provider rejected the request.
    #[error("{provider} request failed: {message}")]
    Api {
        /// Provider name.
        provider: &'static str,
        /// HTTP status, when the failure came from a response.
        status: Option<u16>,
        /// Provider-supplied message, or a generic one.
        message: String,
    },

    /// The provider answered with something we could not read.
    #[error("Unexpected response from {provider}: {message}")]
    Decode {
        /// Provider name.
        provider: &'static str,
        /// Decode failure.
        message: String,
    },

    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The caller supplied unusable input.
    #[error("Invalid request: {0}")]
    InvalidInput(String),
}

impl IntegrationError {
    /// Provider-facing message suitable for surfacing to the caller.
    #[must_use]
    pub fn provider_message(&self) -> String {
        match self {
            Self::Api { message, .. } | Self::Auth { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub(crate) fn api(provider: &'static str, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            provider,
            status,
            message: message.into(),
        }
    }

    pub(crate) fn decode(provider: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            provider,
            message: err.to_string(),
        }
    }
}

/// Convenience alias.
pub type IntegrationResult<T> = Result<T, IntegrationError>;
