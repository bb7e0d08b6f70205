//! Pesapal v3 transaction status classification.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Error object Pesapal embeds in otherwise-200 responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PesapalApiError {
    /// Error category.
    #[serde(default)]
    pub error_type: Option<String>,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Response to `GET /api/Transactions/GetTransactionStatus`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PesapalTransactionStatus {
    /// e.g. `Visa`, `MpesaKE`.
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Amount in major units.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Provider timestamp.
    #[serde(default)]
    pub created_date: Option<String>,
    /// Confirmation code, used for refunds.
    #[serde(default)]
    pub confirmation_code: Option<String>,
    /// e.g. `Completed`, `Failed`.
    #[serde(default)]
    pub payment_status_description: Option<String>,
    /// Order description.
    #[serde(default)]
    pub description: Option<String>,
    /// Provider message.
    #[serde(default)]
    pub message: Option<String>,
    /// Masked payer account.
    #[serde(default)]
    pub payment_account: Option<String>,
    /// Callback URL registered with the order.
    #[serde(default)]
    pub call_back_url: Option<String>,
    /// 0 pending, 1 completed, 2 failed, 3 reversed.
    #[serde(default)]
    pub status_code: Option<i32>,
    /// Our merchant reference.
    #[serde(default)]
    pub merchant_reference: Option<String>,
    /// Status code echoed as text.
    #[serde(default)]
    pub payment_status_code: Option<String>,
    /// ISO currency.
    #[serde(default)]
    pub currency: Option<String>,
    /// Embedded error.
    #[serde(default)]
    pub error: Option<PesapalApiError>,
}

/// Classification of a Pesapal `status_code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PesapalOutcome {
    /// `0`.
    Pending,
    /// `1`.
    Completed,
    /// `2`.
    Failed,
    /// `3`.
    Reversed,
    /// Missing or undocumented code.
    Unknown,
}

impl PesapalOutcome {
    /// Maps a raw status code.
    #[must_use]
    pub const fn from_status_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => Self::Pending,
            Some(1) => Self::Completed,
            Some(2) => Self::Failed,
            Some(3) => Self::Reversed,
            _ => Self::Unknown,
        }
    }

    /// Classifies a status response.
    #[must_use]
    pub const fn from_status(status: &PesapalTransactionStatus) -> Self {
        Self::from_status_code(status.status_code)
    }

    /// Query-string value used on the billing redirect.
    #[must_use]
    pub const fn redirect_status(&self) -> &'static str {
        match self {
            Self::Completed => "success",
            Self::Failed | Self::Reversed => "failed",
            Self::Pending | Self::Unknown => "pending",
        }
    }
}

/// Returns true when `status_code == 1`.
#[must_use]
pub fn is_pesapal_payment_completed(status: &PesapalTransactionStatus) -> bool {
    status.status_code == Some(1)
}

/// Returns true when `status_code == 2`.
#[must_use]
pub fn is_pesapal_payment_failed(status: &PesapalTransactionStatus) -> bool {
    status.status_code == Some(2)
}

/// Returns true when `status_code == 0`.
#[must_use]
pub fn is_pesapal_payment_pending(status: &PesapalTransactionStatus) -> bool {
    status.status_code == Some(0)
}
