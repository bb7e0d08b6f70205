//! Pesapal checkout, callback, IPN and admin routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{ensure_covers, notify_settlement, parse_plan, stored_amount, usd_cents};
use crate::{AppState, ApiError, ApiResult, middleware::AuthUser};
use contentforge_core::billing::merchant_reference;
use contentforge_core::payments::{
    PesapalOutcome, PesapalTransactionStatus, ProviderResult, ensure_refundable,
};
use contentforge_db::entities::{sea_orm_active_enums::PaymentMethod, transaction};
use contentforge_db::{NewTransaction, Settlement, TransactionRepository, UserRepository};
use contentforge_integrations::{
    IpnNotificationType, PesapalCustomer, PesapalOrder, RefundRequest,
};
use contentforge_shared::AppError;
use contentforge_shared::types::{Currency, Money};

/// Path Pesapal returns the browser to, and posts IPNs to.
pub const CALLBACK_PATH: &str = "/api/v1/payments/pesapal/callback";

pub(super) fn public_routes() -> Router<AppState> {
    Router::new().route("/payments/pesapal/callback", get(callback).post(ipn))
}

pub(super) fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/payments/pesapal/initiate", post(initiate))
        .route("/payments/pesapal/ipn/register", post(register_ipn))
        .route("/payments/pesapal/refund", post(refund))
}

/// Body of a checkout request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateBody {
    /// USD in major units, at least the plan price (the default).
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Customer email.
    #[serde(default)]
    pub email: Option<String>,
    /// Customer given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Customer family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Customer phone.
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Plan being bought.
    pub plan: String,
}

/// Checkout response.
#[derive(Debug, Serialize)]
pub struct InitiateResult {
    /// Always true.
    pub success: bool,
    /// Hosted payment page.
    pub redirect_url: String,
    /// Pesapal's order id.
    pub order_tracking_id: String,
    /// Our reference.
    pub merchant_reference: String,
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// POST /payments/pesapal/initiate - Create a hosted checkout order.
async fn initiate(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<InitiateBody>,
) -> ApiResult<Json<InitiateResult>> {
    let gateway = state.pesapal()?.clone();

    let (Some(email), Some(first_name), Some(last_name)) = (
        required(body.email),
        required(body.first_name),
        required(body.last_name),
    ) else {
        return Err(ApiError::validation("Missing required fields"));
    };

    let plan = parse_plan(&body.plan)?;
    let amount = body
        .amount
        .unwrap_or_else(|| plan.usd_price().major_units());
    let cents = usd_cents(amount)?;
    ensure_covers(plan, Money::new(i64::from(cents), Currency::Usd))?;

    let reference = merchant_reference(plan, Utc::now());
    let customer_name = format!("{first_name} {last_name}");
    let phone_number = body.phone_number.unwrap_or_default();

    let order = PesapalOrder::new(
        reference.clone(),
        amount,
        "USD",
        plan.description(),
        state.settings.app.link(CALLBACK_PATH),
        state.settings.pesapal_ipn_id.clone(),
        PesapalCustomer {
            first_name,
            last_name,
            email: email.clone(),
            phone_number: phone_number.clone(),
        },
    );

    let response = gateway.submit_order(order).await?;

    let mut pending = NewTransaction::new(
        auth.user_id(),
        PaymentMethod::Pesapal,
        cents,
        "USD",
        plan.tier().into(),
    );
    pending.customer_email = Some(email);
    pending.customer_name = Some(customer_name);
    pending.customer_phone = Some(phone_number).filter(|p| !p.is_empty());
    pending.pesapal_order_tracking_id = Some(response.order_tracking_id.clone());
    pending.pesapal_merchant_reference = Some(reference.clone());
    pending.metadata = serde_json::to_value(&response).ok();

    let transaction = TransactionRepository::new(state.conn())
        .create_pending(pending)
        .await?;

    info!(
        transaction_id = %transaction.id,
        order_tracking_id = %response.order_tracking_id,
        merchant_reference = %reference,
        "Pesapal order created"
    );

    Ok(Json(InitiateResult {
        success: true,
        redirect_url: response.redirect_url,
        order_tracking_id: response.order_tracking_id,
        merchant_reference: reference,
    }))
}

/// Looks up the order's transaction and applies the provider status to it.
async fn settle_order(
    state: &AppState,
    order_tracking_id: &str,
    merchant_reference: Option<&str>,
    status: &PesapalTransactionStatus,
) -> ApiResult<Option<Settlement>> {
    let repo = TransactionRepository::new(state.conn());

    let mut row = repo.find_by_order_tracking_id(order_tracking_id).await?;
    if row.is_none()
        && let Some(reference) = merchant_reference
    {
        row = repo.find_by_merchant_reference(reference).await?;
    }

    let Some(row) = row else {
        warn!(%order_tracking_id, "Pesapal notification for unknown order");
        return Ok(None);
    };

    let settlement = repo
        .settle(
            row.id,
            &ProviderResult::from(status),
            serde_json::to_value(status).ok(),
            Utc::now(),
        )
        .await?;

    info!(
        transaction_id = %row.id,
        %order_tracking_id,
        status_code = ?status.status_code,
        written = settlement.plan.is_write(),
        "Pesapal status applied"
    );

    notify_settlement(state, &settlement);
    Ok(Some(settlement))
}

/// Query string Pesapal appends to the browser callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Pesapal's order id.
    #[serde(rename = "OrderTrackingId")]
    pub order_tracking_id: Option<String>,
    /// Our merchant reference.
    #[serde(rename = "OrderMerchantReference")]
    pub order_merchant_reference: Option<String>,
}

fn billing_redirect(state: &AppState, status: &str) -> Redirect {
    Redirect::to(
        &state
            .settings
            .app
            .link(&format!("/dashboard/billing?status={status}")),
    )
}

/// GET /payments/pesapal/callback - The customer's browser returns here.
async fn callback(State(state): State<AppState>, Query(query): Query<CallbackQuery>) -> Redirect {
    let Some(order_tracking_id) = query.order_tracking_id.filter(|id| !id.is_empty()) else {
        return billing_redirect(&state, "error");
    };

    let gateway = match state.pesapal() {
        Ok(gateway) => gateway.clone(),
        Err(e) => {
            error!(error = %e.0, "Pesapal callback without a configured gateway");
            return billing_redirect(&state, "error");
        }
    };

    let status = match gateway.transaction_status(&order_tracking_id).await {
        Ok(status) => status,
        Err(e) => {
            error!(error = %e, %order_tracking_id, "Pesapal status check failed");
            return billing_redirect(&state, "error");
        }
    };

    if let Err(e) = settle_order(
        &state,
        &order_tracking_id,
        query.order_merchant_reference.as_deref(),
        &status,
    )
    .await
    {
        error!(error = %e.0, %order_tracking_id, "Failed to apply Pesapal status");
        return billing_redirect(&state, "error");
    }

    billing_redirect(&state, PesapalOutcome::from_status(&status).redirect_status())
}

/// IPN body posted by Pesapal.
#[derive(Debug, Deserialize)]
pub struct IpnBody {
    /// Pesapal's order id.
    #[serde(rename = "OrderTrackingId", default)]
    pub order_tracking_id: Option<String>,
    /// Our merchant reference.
    #[serde(rename = "OrderMerchantReference", default)]
    pub order_merchant_reference: Option<String>,
    /// `IPNCHANGE` for status changes.
    #[serde(rename = "OrderNotificationType", default)]
    pub order_notification_type: Option<String>,
}

/// Acknowledgement body for IPNs.
#[derive(Debug, Serialize)]
pub struct IpnAck {
    /// Always true.
    pub success: bool,
}

/// POST /payments/pesapal/callback - Instant payment notification.
///
/// Only a failed status check answers with an error. Once Pesapal has told
/// us the status, local failures are logged and the IPN is acknowledged.
async fn ipn(State(state): State<AppState>, Json(body): Json<IpnBody>) -> ApiResult<Json<IpnAck>> {
    debug!(payload = ?body, "Pesapal IPN received");

    let Some(order_tracking_id) = body.order_tracking_id.filter(|id| !id.is_empty()) else {
        return Err(ApiError::validation("Missing OrderTrackingId"));
    };

    let status = state
        .pesapal()?
        .transaction_status(&order_tracking_id)
        .await?;

    if let Err(e) = settle_order(
        &state,
        &order_tracking_id,
        body.order_merchant_reference.as_deref(),
        &status,
    )
    .await
    {
        error!(error = %e.0, %order_tracking_id, "Failed to apply Pesapal IPN");
    }

    Ok(Json(IpnAck { success: true }))
}

/// Body of an IPN registration.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterIpnBody {
    /// The URL to register; this deployment's callback route when omitted.
    #[serde(default)]
    pub url: Option<String>,
    /// `GET` or `POST`.
    #[serde(default)]
    pub notification_type: Option<IpnNotificationType>,
}

/// Registered IPN.
#[derive(Debug, Serialize)]
pub struct RegisterIpnResult {
    /// Id to configure as `pesapal.ipn_id`.
    pub ipn_id: String,
    /// The registered URL.
    pub url: String,
}

/// POST /payments/pesapal/ipn/register - Register the IPN URL (admin).
async fn register_ipn(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Option<Json<RegisterIpnBody>>,
) -> ApiResult<Json<RegisterIpnResult>> {
    auth.require_admin()?;
    let body = body.map(|Json(b)| b).unwrap_or_default();

    let url = body
        .url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| state.settings.app.link(CALLBACK_PATH));
    let ipn_id = state
        .pesapal()?
        .register_ipn(&url, body.notification_type.unwrap_or_default())
        .await?;

    info!(%ipn_id, %url, "Pesapal IPN registered");
    Ok(Json(RegisterIpnResult { ipn_id, url }))
}

/// Body of a refund request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundBody {
    /// Transaction to refund.
    pub transaction_id: Uuid,
    /// Major units; the full amount when omitted.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Free text for Pesapal.
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Refund result.
#[derive(Debug, Serialize)]
pub struct RefundResult {
    /// Always true.
    pub success: bool,
    /// The refunded transaction.
    pub transaction: transaction::Model,
}

/// POST /payments/pesapal/refund - Refund a completed Pesapal payment (admin).
async fn refund(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<RefundBody>,
) -> ApiResult<Json<RefundResult>> {
    auth.require_admin()?;
    let gateway = state.pesapal()?.clone();

    let repo = TransactionRepository::new(state.conn());
    let row = repo
        .find_by_id(body.transaction_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Transaction {}", body.transaction_id)))?;

    if row.payment_method != PaymentMethod::Pesapal {
        return Err(ApiError::validation("Only Pesapal payments can be refunded here"));
    }
    ensure_refundable(row.status.into())
        .map_err(|e| ApiError(AppError::BusinessRule(e.to_string())))?;
    let Some(confirmation_code) = row.pesapal_confirmation_code.clone() else {
        return Err(ApiError(AppError::BusinessRule(
            "Transaction has no Pesapal confirmation code".to_string(),
        )));
    };

    let amount = body
        .amount
        .unwrap_or_else(|| stored_amount(&row).major_units());
    let username = UserRepository::new(state.conn())
        .find_by_id(auth.user_id())
        .await?
        .map_or_else(|| auth.user_id().to_string(), |admin| admin.email);

    let response = gateway
        .refund(RefundRequest {
            confirmation_code,
            amount,
            username,
            remarks: body
                .remarks
                .unwrap_or_else(|| "Subscription refund".to_string()),
        })
        .await?;

    if response.status.as_deref() != Some("200") {
        return Err(ApiError(AppError::ExternalService(
            response
                .message
                .unwrap_or_else(|| "Pesapal rejected the refund".to_string()),
        )));
    }

    let transaction = repo.mark_refunded(row.id).await?;
    info!(transaction_id = %transaction.id, %amount, "Pesapal refund issued");

    Ok(Json(RefundResult {
        success: true,
        transaction,
    }))
}
