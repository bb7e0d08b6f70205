//! M-Pesa (Safaricom Daraja) result classification and callback parsing.
//!
//! STK query responses report `ResultCode` as a string, callbacks as an integer.

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Africa::Nairobi;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The request was processed and paid.
pub const RESULT_SUCCESS: &str = "0";
/// The customer dismissed the PIN prompt.
pub const RESULT_CANCELLED_BY_USER: &str = "1032";
/// The PIN prompt timed out.
pub const RESULT_TIMEOUT: &str = "1037";

/// `YYYYMMDDHHmmss`, used for STK timestamps and callback dates.
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Response to `POST /mpesa/stkpush/v1/processrequest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StkPushResponse {
    /// Safaricom merchant request id.
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    /// Checkout request id used to correlate query and callback.
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    /// `"0"` when the prompt was sent.
    #[serde(rename = "ResponseCode")]
    pub response_code: String,
    /// Provider description.
    #[serde(rename = "ResponseDescription")]
    pub response_description: String,
    /// Message suitable for the customer.
    #[serde(rename = "CustomerMessage")]
    pub customer_message: String,
}

/// Response to `POST /mpesa/stkpushquery/v1/query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StkQueryResponse {
    /// `"0"` when the query itself succeeded.
    #[serde(rename = "ResponseCode")]
    pub response_code: String,
    /// Provider description of the query.
    #[serde(rename = "ResponseDescription")]
    pub response_description: String,
    /// Safaricom merchant request id.
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    /// Checkout request id.
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    /// Payment result code.
    #[serde(rename = "ResultCode")]
    pub result_code: String,
    /// Payment result description.
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
}

/// Callback envelope posted to our callback URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkCallbackEnvelope {
    /// Envelope body.
    #[serde(rename = "Body")]
    pub body: StkCallbackBody,
}

/// Callback body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkCallbackBody {
    /// The callback payload.
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

/// STK callback payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkCallback {
    /// Safaricom merchant request id.
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    /// Checkout request id.
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    /// `0` on success.
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    /// Result description.
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
    /// Present only on success.
    #[serde(rename = "CallbackMetadata", default)]
    pub callback_metadata: Option<CallbackMetadata>,
}

/// Name/value list attached to successful callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackMetadata {
    /// Metadata items.
    #[serde(rename = "Item", default)]
    pub items: Vec<CallbackItem>,
}

/// One metadata item. Some items (e.g. `Balance`) carry no value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackItem {
    /// Item name, e.g. `MpesaReceiptNumber`.
    #[serde(rename = "Name")]
    pub name: String,
    /// Item value.
    #[serde(rename = "Value", default)]
    pub value: Option<Value>,
}

impl CallbackMetadata {
    fn get(&self, name: &str) -> Option<&Value> {
        self.items
            .iter()
            .find(|item| item.name == name)
            .and_then(|item| item.value.as_ref())
    }
}

/// Details of a paid STK callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidCallback {
    /// Amount paid in whole shillings.
    pub amount: Option<i64>,
    /// M-Pesa receipt number.
    pub receipt: Option<String>,
    /// When M-Pesa completed the payment.
    pub transaction_date: Option<DateTime<Utc>>,
    /// Paying MSISDN.
    pub phone: Option<String>,
}

/// Interpretation of an STK callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Customer paid.
    Paid(PaidCallback),
    /// Customer cancelled, timed out, or the payment otherwise failed.
    Declined {
        /// Provider result code.
        result_code: i64,
        /// Provider description.
        reason: String,
    },
}

/// Classification of an STK query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MpesaQueryOutcome {
    /// Paid.
    Successful,
    /// Still waiting on the customer.
    Pending,
    /// Cancelled or timed out.
    Failed,
}

impl MpesaQueryOutcome {
    /// Classifies a query response.
    #[must_use]
    pub fn from_query(response: &StkQueryResponse) -> Self {
        if is_mpesa_payment_successful(response) {
            Self::Successful
        } else if is_mpesa_payment_pending(response) {
            Self::Pending
        } else {
            Self::Failed
        }
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }
}

/// Returns true when the query reports a completed payment.
#[must_use]
pub fn is_mpesa_payment_successful(response: &StkQueryResponse) -> bool {
    response.result_code == RESULT_SUCCESS
}

/// Returns true unless the query reports success, cancellation, or timeout.
#[must_use]
pub fn is_mpesa_payment_pending(response: &StkQueryResponse) -> bool {
    ![RESULT_SUCCESS, RESULT_CANCELLED_BY_USER, RESULT_TIMEOUT]
        .contains(&response.result_code.as_str())
}

/// Interprets an STK callback.
///
/// A callback is paid only when `ResultCode` is `0` and metadata is attached.
#[must_use]
pub fn parse_stk_callback(callback: &StkCallback) -> CallbackOutcome {
    match (&callback.callback_metadata, callback.result_code) {
        (Some(metadata), 0) => CallbackOutcome::Paid(PaidCallback {
            amount: metadata.get("Amount").and_then(value_as_whole_number),
            receipt: metadata.get("MpesaReceiptNumber").and_then(value_as_string),
            transaction_date: metadata
                .get("TransactionDate")
                .and_then(value_as_string)
                .and_then(|raw| parse_mpesa_transaction_date(&raw)),
            phone: metadata.get("PhoneNumber").and_then(value_as_string),
        }),
        _ => CallbackOutcome::Declined {
            result_code: callback.result_code,
            reason: callback.result_desc.clone(),
        },
    }
}

/// Parses a callback `TransactionDate` (`YYYYMMDDHHmmss`, East Africa Time).
#[must_use]
pub fn parse_mpesa_transaction_date(raw: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()?;
    Nairobi
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

/// STK timestamp for `now`, rendered in Nairobi local time.
#[must_use]
pub fn stk_timestamp(now: DateTime<Utc>) -> String {
    now.with_timezone(&Nairobi)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// STK password: `base64(shortcode + passkey + timestamp)`.
#[must_use]
pub fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    STANDARD.encode(format!("{shortcode}{passkey}{timestamp}"))
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_as_whole_number(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let text = value_as_string(value)?;
    text.parse::<Decimal>().ok()?.round().to_i64()
}
