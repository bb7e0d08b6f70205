//! Payment routes for M-Pesa STK push and Pesapal checkout.
//!
//! Checkout routes store a pending transaction. Provider callbacks, IPNs and
//! status checks settle it through `TransactionRepository::settle`, which is
//! idempotent, then notify the customer by email.

use std::str::FromStr;

use axum::Router;
use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::{AppState, ApiError, ApiResult, notify};
use contentforge_core::billing::{PlanTier, SubscriptionTier};
use contentforge_core::payments::SettlementPlan;
use contentforge_db::Settlement;
use contentforge_db::entities::{sea_orm_active_enums::PaymentMethod, transaction};
use contentforge_shared::email::{PaymentFailure, PaymentReceipt};
use contentforge_shared::types::{Currency, Money};

pub mod mpesa;
pub mod pesapal;

#[cfg(test)]
mod tests;

/// Provider callbacks, reachable without a session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .merge(mpesa::public_routes())
        .merge(pesapal::public_routes())
}

/// Checkout, status and admin routes.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .merge(mpesa::protected_routes())
        .merge(pesapal::protected_routes())
}

pub(crate) fn parse_plan(raw: &str) -> ApiResult<PlanTier> {
    PlanTier::from_str(raw).map_err(ApiError::validation)
}

/// Rounds a caller-supplied amount and checks it is positive.
pub(crate) fn whole_amount(amount: Decimal) -> ApiResult<i64> {
    amount
        .round()
        .to_i64()
        .filter(|a| *a > 0)
        .ok_or_else(|| ApiError::validation("Amount must be a positive number"))
}

/// Rejects a charge that does not pay for the plan.
pub(crate) fn ensure_covers(plan: PlanTier, amount: Money) -> ApiResult<()> {
    if plan.covers(amount) {
        return Ok(());
    }
    Err(ApiError::validation(format!(
        "Amount {} is below the {plan} plan price of {}",
        amount.display(),
        plan.price(amount.currency).display()
    )))
}

/// Converts a major-unit USD amount to stored cents.
pub(crate) fn usd_cents(amount: Decimal) -> ApiResult<i32> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i32()
        .filter(|a| *a > 0)
        .ok_or_else(|| ApiError::validation("Amount must be a positive number"))
}

pub(crate) fn stored_amount(row: &transaction::Model) -> Money {
    let currency = Currency::from_str(&row.currency).unwrap_or(Currency::Usd);
    Money::new(i64::from(row.amount), currency)
}

fn plan_name(row: &transaction::Model) -> String {
    let tier = SubscriptionTier::from(row.tier);
    tier.plan().map_or_else(
        || tier.as_str().to_string(),
        |plan| plan.display_name().to_string(),
    )
}

const fn method_name(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Mpesa => "M-Pesa",
        PaymentMethod::Pesapal => "Pesapal",
        PaymentMethod::Stripe => "Card",
    }
}

/// Emails the customer about a settlement that changed the transaction.
pub(crate) fn notify_settlement(state: &AppState, settlement: &Settlement) {
    let row = &settlement.transaction;
    let Some(to) = row.customer_email.clone() else {
        tracing::debug!(transaction_id = %row.id, "No customer email on transaction");
        return;
    };
    let customer_name = row
        .customer_name
        .clone()
        .unwrap_or_else(|| "there".to_string());

    match &settlement.plan {
        SettlementPlan::Complete { receipt, .. } => notify::payment_success(
            &state.email_service,
            PaymentReceipt {
                to,
                customer_name,
                plan_name: plan_name(row),
                amount: stored_amount(row),
                receipt_number: receipt.clone(),
                payment_method: method_name(row.payment_method).to_string(),
            },
        ),
        SettlementPlan::Fail { error_message } => notify::payment_failed(
            &state.email_service,
            PaymentFailure {
                to,
                customer_name,
                plan_name: plan_name(row),
                amount: stored_amount(row),
                error_message: Some(error_message.clone()),
            },
        ),
        SettlementPlan::Skip { .. } => {}
    }
}
