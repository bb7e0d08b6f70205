//! Safaricom Daraja client: OAuth, STK push, STK query.

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Utc;
use contentforge_core::payments::mpesa::{stk_password, stk_timestamp};
use contentforge_core::payments::{StkPushResponse, StkQueryResponse};
use contentforge_core::phone::format_kenyan_phone_number;
use contentforge_shared::config::MpesaConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IntegrationError, IntegrationResult};
use crate::http::{self, DEFAULT_TIMEOUT};
use crate::token::{AccessToken, TokenCache};

const PROVIDER: &str = "M-Pesa";

/// Daraja lifetime when `expires_in` is missing or unreadable.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3599);

/// An STK push (Lipa Na M-Pesa Online) request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StkPushRequest {
    /// Customer phone in any accepted Kenyan format.
    pub phone: String,
    /// Whole shillings.
    pub amount: i64,
    /// Shown to the customer on the prompt.
    pub account_reference: String,
    /// Transaction description.
    pub description: String,
    /// Where Daraja posts the result.
    pub callback_url: String,
}

/// M-Pesa operations the API layer depends on.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait MpesaGateway: Send + Sync {
    /// Sends an STK push prompt to the customer's phone.
    async fn stk_push(&self, request: StkPushRequest) -> IntegrationResult<StkPushResponse>;

    /// Queries the state of an STK push.
    async fn stk_query(&self, checkout_request_id: &str) -> IntegrationResult<StkQueryResponse>;
}

#[derive(Debug, Deserialize)]
struct OAuthResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<Value>,
}

impl OAuthResponse {
    fn lifetime(&self) -> Duration {
        self.expires_in
            .as_ref()
            .and_then(|v| v.as_u64().or_else(|| v.as_str()?.parse().ok()))
            .map_or(DEFAULT_TOKEN_LIFETIME, Duration::from_secs)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StkPushBody<'a> {
    business_short_code: &'a str,
    password: String,
    timestamp: String,
    transaction_type: &'static str,
    amount: i64,
    party_a: &'a str,
    party_b: &'a str,
    phone_number: &'a str,
    #[serde(rename = "CallBackURL")]
    callback_url: &'a str,
    account_reference: &'a str,
    transaction_desc: &'a str,
}

#[derive(Debug, Serialize)]
struct StkQueryBody<'a> {
    #[serde(rename = "BusinessShortCode")]
    business_short_code: &'a str,
    #[serde(rename = "Password")]
    password: String,
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "CheckoutRequestID")]
    checkout_request_id: &'a str,
}

/// Daraja HTTP client.
#[derive(Clone)]
pub struct MpesaClient {
    http: reqwest::Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
    passkey: String,
    shortcode: String,
    tokens: TokenCache,
}

impl MpesaClient {
    /// Builds a client for the configured environment.
    pub fn new(config: &MpesaConfig) -> IntegrationResult<Self> {
        Ok(Self {
            http: http::client(DEFAULT_TIMEOUT)?,
            base_url: config.base_url(),
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
            passkey: config.passkey.clone(),
            shortcode: config.shortcode.clone(),
            tokens: TokenCache::new(PROVIDER),
        })
    }

    async fn send<B>(&self, build: B) -> IntegrationResult<reqwest::Response>
    where
        B: Fn(&str) -> reqwest::RequestBuilder,
    {
        self.tokens.send_authorized(|| self.fetch_token(), build).await
    }

    async fn fetch_token(&self) -> IntegrationResult<AccessToken> {
        let credentials = STANDARD.encode(format!("{}:{}", self.consumer_key, self.consumer_secret));

        let response = self
            .http
            .get(format!("{}/oauth/v1/generate", self.base_url))
            .query(&[("grant_type", "client_credentials")])
            .header(reqwest::header::AUTHORIZATION, format!("Basic {credentials}"))
            .send()
            .await?;

        let oauth: OAuthResponse = http::read_json(
            PROVIDER,
            response,
            "/errorMessage",
            "Failed to authenticate with M-Pesa",
        )
        .await
        .map_err(|e| IntegrationError::Auth {
            provider: PROVIDER,
            message: e.provider_message(),
        })?;

        tracing::debug!(lifetime_secs = oauth.lifetime().as_secs(), "Fetched M-Pesa access token");
        Ok(AccessToken::new(oauth.access_token.clone(), oauth.lifetime()))
    }

    fn credentials_now(&self) -> (String, String) {
        let timestamp = stk_timestamp(Utc::now());
        let password = stk_password(&self.shortcode, &self.passkey, &timestamp);
        (password, timestamp)
    }
}

#[async_trait]
impl MpesaGateway for MpesaClient {
    async fn stk_push(&self, request: StkPushRequest) -> IntegrationResult<StkPushResponse> {
        if request.amount < 1 {
            return Err(IntegrationError::InvalidInput(
                "Amount must be at least 1 shilling".to_string(),
            ));
        }

        let (password, timestamp) = self.credentials_now();
        let phone = format_kenyan_phone_number(&request.phone);

        let body = StkPushBody {
            business_short_code: &self.shortcode,
            password,
            timestamp,
            transaction_type: "CustomerPayBillOnline",
            amount: request.amount,
            party_a: &phone,
            party_b: &self.shortcode,
            phone_number: &phone,
            callback_url: &request.callback_url,
            account_reference: &request.account_reference,
            transaction_desc: &request.description,
        };

        tracing::debug!(phone = %phone, amount = request.amount, "Sending STK push");

        let url = format!("{}/mpesa/stkpush/v1/processrequest", self.base_url);
        let response = self
            .send(|token| self.http.post(&url).bearer_auth(token).json(&body))
            .await?;

        http::read_json(
            PROVIDER,
            response,
            "/errorMessage",
            "Failed to initiate M-Pesa payment",
        )
        .await
    }

    async fn stk_query(&self, checkout_request_id: &str) -> IntegrationResult<StkQueryResponse> {
        let (password, timestamp) = self.credentials_now();

        let body = StkQueryBody {
            business_short_code: &self.shortcode,
            password,
            timestamp,
            checkout_request_id,
        };

        let url = format!("{}/mpesa/stkpushquery/v1/query", self.base_url);
        let response = self
            .send(|token| self.http.post(&url).bearer_auth(token).json(&body))
            .await?;

        http::read_json(
            PROVIDER,
            response,
            "/errorMessage",
            "Failed to query M-Pesa transaction status",
        )
        .await
    }
}
