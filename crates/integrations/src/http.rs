//! Shared HTTP plumbing for provider clients.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{IntegrationError, IntegrationResult};

const USER_AGENT: &str = concat!("contentforge/", env!("CARGO_PKG_VERSION"));

/// Default request timeout for provider calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn client(timeout: Duration) -> IntegrationResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// Decodes a JSON response body.
///
/// Non-2xx responses become `IntegrationError::Api` carrying the string at
/// the JSON pointer `message_at` in the error body, or `fallback`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &'static str,
    response: reqwest::Response,
    message_at: &str,
    fallback: &str,
) -> IntegrationResult<T> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        tracing::error!(
            provider,
            status = status.as_u16(),
            body = %String::from_utf8_lossy(&body),
            "Provider request failed"
        );
        let message = serde_json::from_slice::<Value>(&body)
            .ok()
            .and_then(|v| v.pointer(message_at)?.as_str().map(str::to_string))
            .unwrap_or_else(|| fallback.to_string());
        return Err(IntegrationError::api(provider, Some(status.as_u16()), message));
    }

    serde_json::from_slice(&body).map_err(|e| IntegrationError::decode(provider, e))
}
