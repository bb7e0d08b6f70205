//! Payment result classification and settlement planning.
//!
//! Both providers push results to us (M-Pesa STK callback, Pesapal IPN) and
//! can be queried. This module turns either into a `SettlementPlan`.

pub mod mpesa;
pub mod pesapal;
pub mod settlement;

#[cfg(test)]
mod props;

pub use mpesa::{
    CallbackOutcome, MpesaQueryOutcome, PaidCallback, StkCallback, StkCallbackEnvelope,
    StkPushResponse, StkQueryResponse, is_mpesa_payment_pending, is_mpesa_payment_successful,
    parse_mpesa_transaction_date, parse_stk_callback,
};
pub use pesapal::{
    PesapalOutcome, PesapalTransactionStatus, is_pesapal_payment_completed,
    is_pesapal_payment_failed, is_pesapal_payment_pending,
};
pub use settlement::{
    ProviderResult, SettlementError, SettlementPlan, SkipReason, SubscriptionActivation,
    TransactionStatus, ensure_refundable, plan_settlement,
};
