//! Cached OAuth bearer tokens.
//!
//! Each provider client holds one `TokenCache`. The cached token expires
//! five minutes before the provider says it does, and concurrent callers on
//! a cold cache share a single fetch.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;

use crate::error::{IntegrationError, IntegrationResult};

/// How long before the provider expiry a token is refreshed.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// A bearer token and how long it may be cached.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Bearer value.
    pub value: String,
    ttl: Duration,
}

impl AccessToken {
    /// A token the provider says is valid for `lifetime`.
    #[must_use]
    pub fn new(value: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            value: value.into(),
            ttl: lifetime.saturating_sub(REFRESH_MARGIN),
        }
    }

    /// Time it stays in the cache.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

struct TokenExpiry;

impl Expiry<(), AccessToken> for TokenExpiry {
    fn expire_after_create(
        &self,
        _key: &(),
        value: &AccessToken,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Single-entry token cache.
#[derive(Clone)]
pub struct TokenCache {
    provider: &'static str,
    cache: Cache<(), AccessToken>,
}

impl TokenCache {
    /// Empty cache for `provider`.
    #[must_use]
    pub fn new(provider: &'static str) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .expire_after(TokenExpiry)
            .build();
        Self { provider, cache }
    }

    /// Returns the cached token, running `fetch` when there is none.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> IntegrationResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = IntegrationResult<AccessToken>>,
    {
        self.cache
            .try_get_with((), fetch())
            .await
            .map(|token| token.value)
            .map_err(|shared| {
                Arc::try_unwrap(shared).unwrap_or_else(|shared| IntegrationError::Auth {
                    provider: self.provider,
                    message: shared.to_string(),
                })
            })
    }

    /// Drops the cached token.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }

    /// Sends a bearer-authenticated request built by `build`.
    ///
    /// A `401 Unauthorized` answer means the provider revoked the cached
    /// token before its expiry. The token is dropped, a new one fetched, and
    /// the request sent once more.
    pub async fn send_authorized<F, Fut, B>(
        &self,
        fetch: F,
        build: B,
    ) -> IntegrationResult<reqwest::Response>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = IntegrationResult<AccessToken>>,
        B: Fn(&str) -> reqwest::RequestBuilder,
    {
        let token = self.get_or_fetch(&fetch).await?;
        let response = build(&token).send().await?;
        if response.status() != reqwest::StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::warn!(provider = self.provider, "Access token rejected, fetching a new one");
        self.invalidate().await;
        let token = self.get_or_fetch(&fetch).await?;
        Ok(build(&token).send().await?)
    }
}
