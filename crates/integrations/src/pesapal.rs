//! Pesapal v3 client: token, IPN registration, orders, status, refunds.
//!
//! Pesapal reports some failures as HTTP 200 with an `error` object in the
//! body. Those are surfaced as `IntegrationError::Api` like any other failure.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contentforge_core::payments::PesapalTransactionStatus;
use contentforge_core::payments::pesapal::PesapalApiError;
use contentforge_shared::config::PesapalConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{IntegrationError, IntegrationResult};
use crate::http::{self, DEFAULT_TIMEOUT};
use crate::token::{AccessToken, TokenCache};

const PROVIDER: &str = "Pesapal";

/// Lifetime assumed when `expiryDate` is missing or unreadable.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Country used when the customer gives none.
pub const DEFAULT_COUNTRY_CODE: &str = "KE";

/// Customer details attached to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PesapalCustomer {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Phone number, possibly empty.
    pub phone_number: String,
}

/// Billing address block of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingAddress {
    /// Email address.
    pub email_address: String,
    /// Phone number.
    pub phone_number: String,
    /// ISO country code.
    pub country_code: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// Body of `SubmitOrderRequest`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PesapalOrder {
    /// Our merchant reference.
    pub id: String,
    /// ISO currency.
    pub currency: String,
    /// Amount in major units.
    pub amount: Decimal,
    /// Shown on the Pesapal page.
    pub description: String,
    /// Where the customer's browser returns.
    pub callback_url: String,
    /// Registered IPN id.
    pub notification_id: String,
    /// Billing details.
    pub billing_address: BillingAddress,
}

impl PesapalOrder {
    /// Builds an order for `customer`, billing address in Kenya.
    #[must_use]
    pub fn new(
        merchant_reference: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
        description: impl Into<String>,
        callback_url: impl Into<String>,
        notification_id: impl Into<String>,
        customer: PesapalCustomer,
    ) -> Self {
        Self {
            id: merchant_reference.into(),
            currency: currency.into(),
            amount,
            description: description.into(),
            callback_url: callback_url.into(),
            notification_id: notification_id.into(),
            billing_address: BillingAddress {
                email_address: customer.email,
                phone_number: customer.phone_number,
                country_code: DEFAULT_COUNTRY_CODE.to_string(),
                first_name: customer.first_name,
                last_name: customer.last_name,
            },
        }
    }
}

/// Response to `SubmitOrderRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PesapalPaymentResponse {
    /// Pesapal's id for the order.
    pub order_tracking_id: String,
    /// Echo of our reference.
    pub merchant_reference: String,
    /// Hosted payment page.
    pub redirect_url: String,
    /// Response status, `"200"` on success.
    #[serde(default)]
    pub status: Option<String>,
}

/// A refund for a completed payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundRequest {
    /// Confirmation code from the transaction status.
    pub confirmation_code: String,
    /// Amount in major units.
    pub amount: Decimal,
    /// Who asked for it.
    pub username: String,
    /// Free text.
    pub remarks: String,
}

/// Refund acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundResponse {
    /// `"200"` when accepted.
    #[serde(default)]
    pub status: Option<String>,
    /// Provider message.
    #[serde(default)]
    pub message: Option<String>,
}

/// IPN delivery method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IpnNotificationType {
    /// Query-string notification.
    Get,
    /// JSON body notification.
    #[default]
    Post,
}

/// Pesapal operations the API layer depends on.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait PesapalGateway: Send + Sync {
    /// Registers an IPN URL and returns its id.
    async fn register_ipn(
        &self,
        url: &str,
        notification_type: IpnNotificationType,
    ) -> IntegrationResult<String>;

    /// Creates an order and returns the hosted payment page.
    async fn submit_order(&self, order: PesapalOrder) -> IntegrationResult<PesapalPaymentResponse>;

    /// Fetches the status of an order.
    async fn transaction_status(
        &self,
        order_tracking_id: &str,
    ) -> IntegrationResult<PesapalTransactionStatus>;

    /// Requests a refund of a completed payment.
    async fn refund(&self, request: RefundRequest) -> IntegrationResult<RefundResponse>;
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    consumer_key: &'a str,
    consumer_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(rename = "expiryDate", default)]
    expiry_date: Option<String>,
    #[serde(default)]
    error: Option<PesapalApiError>,
}

impl TokenResponse {
    fn lifetime(&self, now: DateTime<Utc>) -> Duration {
        self.expiry_date
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .and_then(|expiry| (expiry.with_timezone(&Utc) - now).to_std().ok())
            .unwrap_or(DEFAULT_TOKEN_LIFETIME)
    }
}

#[derive(Debug, Serialize)]
struct RegisterIpnBody<'a> {
    url: &'a str,
    ipn_notification_type: IpnNotificationType,
}

#[derive(Debug, Deserialize)]
struct RegisterIpnResponse {
    #[serde(default)]
    ipn_id: Option<String>,
    #[serde(default)]
    error: Option<PesapalApiError>,
}

#[derive(Debug, Deserialize)]
struct OrderEnvelope {
    #[serde(flatten)]
    order: Option<PesapalPaymentResponse>,
    #[serde(default)]
    error: Option<PesapalApiError>,
}

/// Pesapal sends an `error` object of nulls on success; only a non-blank
/// message or code counts.
fn embedded_error(error: Option<&PesapalApiError>) -> Option<IntegrationError> {
    let error = error?;
    let populated = |field: Option<&String>| field.filter(|v| !v.trim().is_empty()).cloned();
    let message = populated(error.message.as_ref()).or_else(|| populated(error.code.as_ref()))?;
    Some(IntegrationError::api(PROVIDER, None, message))
}

/// Pesapal v3 HTTP client.
#[derive(Clone)]
pub struct PesapalClient {
    http: reqwest::Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
    tokens: TokenCache,
}

impl PesapalClient {
    /// Builds a client for the configured environment.
    pub fn new(config: &PesapalConfig) -> IntegrationResult<Self> {
        Ok(Self {
            http: http::client(DEFAULT_TIMEOUT)?,
            base_url: config.base_url(),
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
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
        let response = self
            .http
            .post(format!("{}/api/Auth/RequestToken", self.base_url))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&TokenRequest {
                consumer_key: &self.consumer_key,
                consumer_secret: &self.consumer_secret,
            })
            .send()
            .await?;

        let auth_failed = |message: String| IntegrationError::Auth {
            provider: PROVIDER,
            message,
        };

        let body: TokenResponse = http::read_json(
            PROVIDER,
            response,
            "/message",
            "Failed to authenticate with Pesapal",
        )
        .await
        .map_err(|e| auth_failed(e.provider_message()))?;

        if let Some(err) = embedded_error(body.error.as_ref()) {
            return Err(auth_failed(err.provider_message()));
        }

        let lifetime = body.lifetime(Utc::now());
        let token = body
            .token
            .ok_or_else(|| auth_failed("No token in response".to_string()))?;

        tracing::debug!(lifetime_secs = lifetime.as_secs(), "Fetched Pesapal access token");
        Ok(AccessToken::new(token, lifetime))
    }
}

#[async_trait]
impl PesapalGateway for PesapalClient {
    async fn register_ipn(
        &self,
        url: &str,
        notification_type: IpnNotificationType,
    ) -> IntegrationResult<String> {
        let endpoint = format!("{}/api/URLSetup/RegisterIPN", self.base_url);
        let body = RegisterIpnBody {
            url,
            ipn_notification_type: notification_type,
        };
        let response = self
            .send(|token| {
                self.http
                    .post(&endpoint)
                    .bearer_auth(token)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .json(&body)
            })
            .await?;

        let body: RegisterIpnResponse = http::read_json(
            PROVIDER,
            response,
            "/message",
            "Failed to register IPN with Pesapal",
        )
        .await?;

        if let Some(err) = embedded_error(body.error.as_ref()) {
            return Err(err);
        }

        let ipn_id = body
            .ipn_id
            .ok_or_else(|| IntegrationError::decode(PROVIDER, "missing ipn_id"))?;
        tracing::info!(ipn_id = %ipn_id, url, "Registered Pesapal IPN");
        Ok(ipn_id)
    }

    async fn submit_order(&self, order: PesapalOrder) -> IntegrationResult<PesapalPaymentResponse> {
        tracing::debug!(merchant_reference = %order.id, amount = %order.amount, "Submitting Pesapal order");

        let url = format!("{}/api/Transactions/SubmitOrderRequest", self.base_url);
        let response = self
            .send(|token| {
                self.http
                    .post(&url)
                    .bearer_auth(token)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .json(&order)
            })
            .await?;

        let body: OrderEnvelope = http::read_json(
            PROVIDER,
            response,
            "/message",
            "Failed to submit order request to Pesapal",
        )
        .await?;

        if let Some(err) = embedded_error(body.error.as_ref()) {
            return Err(err);
        }

        body.order
            .ok_or_else(|| IntegrationError::decode(PROVIDER, "missing order_tracking_id"))
    }

    async fn transaction_status(
        &self,
        order_tracking_id: &str,
    ) -> IntegrationResult<PesapalTransactionStatus> {
        let url = format!("{}/api/Transactions/GetTransactionStatus", self.base_url);
        let response = self
            .send(|token| {
                self.http
                    .get(&url)
                    .query(&[("orderTrackingId", order_tracking_id)])
                    .bearer_auth(token)
                    .header(reqwest::header::ACCEPT, "application/json")
            })
            .await?;

        http::read_json(
            PROVIDER,
            response,
            "/message",
            "Failed to get transaction status from Pesapal",
        )
        .await
    }

    async fn refund(&self, request: RefundRequest) -> IntegrationResult<RefundResponse> {
        let url = format!("{}/api/Transactions/RefundRequest", self.base_url);
        let response = self
            .send(|token| {
                self.http
                    .post(&url)
                    .bearer_auth(token)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .json(&request)
            })
            .await?;

        let body: RefundResponse = http::read_json(
            PROVIDER,
            response,
            "/message",
            "Failed to process refund with Pesapal",
        )
        .await?;

        match body.status.as_deref() {
            Some("200") | None => Ok(body),
            Some(_) => Err(IntegrationError::api(
                PROVIDER,
                None,
                body.message
                    .unwrap_or_else(|| "Failed to process refund with Pesapal".to_string()),
            )),
        }
    }
}
