//! M-Pesa STK push, callback and status routes.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{ensure_covers, notify_settlement, parse_plan, whole_amount};
use crate::{AppState, ApiError, ApiResult, middleware::AuthUser};
use contentforge_core::billing::{PollPolicy, account_reference};
use contentforge_core::payments::{
    CallbackOutcome, MpesaQueryOutcome, ProviderResult, StkCallbackEnvelope, StkPushResponse,
    StkQueryResponse, parse_stk_callback,
};
use contentforge_core::phone::KenyanMsisdn;
use contentforge_db::entities::sea_orm_active_enums::PaymentMethod;
use contentforge_db::{NewTransaction, TransactionRepository, UserRepository};
use contentforge_integrations::StkPushRequest;
use contentforge_shared::types::Money;

/// Path Daraja posts results to.
pub const CALLBACK_PATH: &str = "/api/v1/payments/mpesa/callback";

pub(super) fn public_routes() -> Router<AppState> {
    Router::new().route("/payments/mpesa/callback", post(callback))
}

pub(super) fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/payments/mpesa/stk-push", post(stk_push))
        .route("/payments/mpesa/status", get(status))
}

/// Body of an STK push request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StkPushBody {
    /// Customer phone in any Kenyan format.
    pub phone_number: String,
    /// Whole shillings, at least the plan's KES price (the default).
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Plan being bought.
    pub plan: String,
    /// Shown on the customer's prompt.
    #[serde(default)]
    pub account_reference: Option<String>,
    /// Transaction description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Successful STK push response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StkPushResult {
    /// Always true.
    pub success: bool,
    /// Daraja's response fields.
    #[serde(flatten)]
    pub response: StkPushResponse,
    /// Our pending transaction.
    pub transaction_id: Uuid,
    /// How the client should poll the status route.
    pub poll: PollPolicy,
}

/// Daraja's acknowledgement body. Any other answer makes it retry.
fn accepted() -> Json<serde_json::Value> {
    Json(json!({ "ResultCode": 0, "ResultDesc": "Accepted" }))
}

/// POST /payments/mpesa/stk-push - Prompt the customer's phone for payment.
async fn stk_push(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<StkPushBody>,
) -> ApiResult<Response> {
    let gateway = state.mpesa()?.clone();

    let phone = KenyanMsisdn::parse(&body.phone_number)
        .map_err(|e| ApiError::validation(e.to_string()))?;
    let plan = parse_plan(&body.plan)?;
    let amount = match body.amount {
        Some(amount) => whole_amount(amount)?,
        None => plan.kes_price().amount,
    };
    ensure_covers(plan, Money::kes(amount))?;
    let stored_amount =
        i32::try_from(amount).map_err(|_| ApiError::validation("Amount is too large"))?;

    let user = UserRepository::new(state.conn())
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let request = StkPushRequest {
        phone: phone.as_str().to_string(),
        amount,
        account_reference: body
            .account_reference
            .unwrap_or_else(|| account_reference(plan)),
        description: body.description.unwrap_or_else(|| plan.description()),
        callback_url: state.settings.app.link(CALLBACK_PATH),
    };

    let response = match gateway.stk_push(request).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, user_id = %user.id, "M-Pesa STK push failed");
            let message = e.provider_message();
            return Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": message,
                    "ResponseCode": "1",
                    "ResponseDescription": message,
                })),
            )
                .into_response());
        }
    };

    let mut pending = NewTransaction::new(
        user.id,
        PaymentMethod::Mpesa,
        stored_amount,
        "KES",
        plan.tier().into(),
    );
    pending.customer_email = Some(user.email);
    pending.customer_name = Some(user.name);
    pending.customer_phone = Some(phone.to_string());
    pending.mpesa_checkout_request_id = Some(response.checkout_request_id.clone());
    pending.mpesa_merchant_request_id = Some(response.merchant_request_id.clone());
    pending.metadata = serde_json::to_value(&response).ok();

    let transaction = TransactionRepository::new(state.conn())
        .create_pending(pending)
        .await?;

    info!(
        transaction_id = %transaction.id,
        checkout_request_id = %response.checkout_request_id,
        amount,
        "M-Pesa STK push sent"
    );

    Ok(Json(StkPushResult {
        success: true,
        response,
        transaction_id: transaction.id,
        poll: PollPolicy::STK_DEFAULT,
    })
    .into_response())
}

/// POST /payments/mpesa/callback - Daraja's STK result. Always acknowledged.
async fn callback(State(state): State<AppState>, body: Bytes) -> Json<serde_json::Value> {
    let envelope: StkCallbackEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "Unreadable M-Pesa callback");
            return accepted();
        }
    };

    if let Err(e) = handle_callback(&state, envelope).await {
        error!(error = %e.0, "M-Pesa callback processing failed");
    }

    accepted()
}

async fn handle_callback(state: &AppState, envelope: StkCallbackEnvelope) -> ApiResult<()> {
    let callback = envelope.body.stk_callback;
    debug!(payload = ?callback, "M-Pesa callback received");

    let outcome = parse_stk_callback(&callback);
    let repo = TransactionRepository::new(state.conn());

    let Some(row) = repo
        .find_by_checkout_request_id(&callback.checkout_request_id)
        .await?
    else {
        warn!(
            checkout_request_id = %callback.checkout_request_id,
            "M-Pesa callback for unknown checkout"
        );
        return Ok(());
    };

    if let CallbackOutcome::Paid(paid) = &outcome
        && let Some(amount) = paid.amount
        && amount != i64::from(row.amount)
    {
        warn!(
            transaction_id = %row.id,
            expected = row.amount,
            received = amount,
            "M-Pesa amount differs from the stored amount"
        );
    }

    let settlement = repo
        .settle(
            row.id,
            &ProviderResult::from(&outcome),
            serde_json::to_value(&callback).ok(),
            Utc::now(),
        )
        .await?;

    info!(
        transaction_id = %row.id,
        checkout_request_id = %callback.checkout_request_id,
        result_code = callback.result_code,
        written = settlement.plan.is_write(),
        "M-Pesa callback processed"
    );

    notify_settlement(state, &settlement);
    Ok(())
}

/// Query string of the status route.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    /// The STK push to look up.
    #[serde(rename = "checkoutRequestID")]
    pub checkout_request_id: Option<String>,
}

/// Status response: Daraja's query result plus a classification.
#[derive(Debug, Serialize)]
pub struct StatusResult {
    /// Daraja's response fields.
    #[serde(flatten)]
    pub response: StkQueryResponse,
    /// `successful`, `pending` or `failed`.
    pub status: MpesaQueryOutcome,
}

fn query_result(outcome: MpesaQueryOutcome, response: &StkQueryResponse) -> ProviderResult {
    match outcome {
        MpesaQueryOutcome::Successful => ProviderResult::Paid {
            receipt: None,
            paid_at: None,
        },
        MpesaQueryOutcome::Failed => ProviderResult::Failed {
            reason: Some(response.result_desc.clone()),
        },
        MpesaQueryOutcome::Pending => ProviderResult::Pending,
    }
}

/// GET /payments/mpesa/status - Query an STK push.
///
/// A final answer also settles the caller's pending transaction, covering
/// callbacks that never arrive.
async fn status(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<StatusResult>> {
    let Some(checkout_request_id) = query.checkout_request_id.filter(|id| !id.is_empty()) else {
        return Err(ApiError::validation("Missing checkoutRequestID"));
    };

    let response = state.mpesa()?.stk_query(&checkout_request_id).await?;
    let outcome = MpesaQueryOutcome::from_query(&response);

    if outcome != MpesaQueryOutcome::Pending {
        let repo = TransactionRepository::new(state.conn());
        if let Some(row) = repo.find_by_checkout_request_id(&checkout_request_id).await?
            && row.user_id == auth.user_id()
        {
            let settlement = repo
                .settle(
                    row.id,
                    &query_result(outcome, &response),
                    None,
                    Utc::now(),
                )
                .await?;
            notify_settlement(&state, &settlement);
        }
    }

    Ok(Json(StatusResult { response, status: outcome }))
}
