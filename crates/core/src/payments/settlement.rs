//! Settlement planning.
//!
//! A provider callback is reduced to a `ProviderResult`, then planned against
//! the stored transaction. The plan is applied by the database layer in one
//! transaction. Only pending transactions are ever settled, so a replayed
//! callback plans a `Skip`.

use chrono::{DateTime, Duration, Utc};
use contentforge_shared::types::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::mpesa::CallbackOutcome;
use super::pesapal::{PesapalOutcome, PesapalTransactionStatus};
use crate::billing::SubscriptionTier;

/// Length of a paid billing period, in days.
pub const BILLING_PERIOD_DAYS: i64 = 30;

/// Lifecycle of a payment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Waiting on the provider.
    Pending,
    /// Paid.
    Completed,
    /// Declined, cancelled, or timed out.
    Failed,
    /// Paid and later refunded.
    Refunded,
}

impl TransactionStatus {
    /// Returns true if moving to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed | Self::Failed) | (Self::Completed, Self::Refunded)
        )
    }

    /// Column value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// The requested status change is not allowed.
    #[error("Cannot move transaction from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: TransactionStatus,
        /// Requested status.
        to: TransactionStatus,
    },
}

/// Provider-reported result, independent of provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResult {
    /// Money moved.
    Paid {
        /// Receipt / confirmation code.
        receipt: Option<String>,
        /// Provider completion time, if reported.
        paid_at: Option<DateTime<Utc>>,
    },
    /// Payment did not go through.
    Failed {
        /// Provider description.
        reason: Option<String>,
    },
    /// No final answer yet.
    Pending,
}

impl From<&CallbackOutcome> for ProviderResult {
    fn from(outcome: &CallbackOutcome) -> Self {
        match outcome {
            CallbackOutcome::Paid(paid) => Self::Paid {
                receipt: paid.receipt.clone(),
                paid_at: paid.transaction_date,
            },
            CallbackOutcome::Declined { reason, .. } => Self::Failed {
                reason: Some(reason.clone()),
            },
        }
    }
}

impl From<&PesapalTransactionStatus> for ProviderResult {
    fn from(status: &PesapalTransactionStatus) -> Self {
        match PesapalOutcome::from_status(status) {
            PesapalOutcome::Completed => Self::Paid {
                receipt: status.confirmation_code.clone().filter(|c| !c.is_empty()),
                paid_at: None,
            },
            PesapalOutcome::Failed | PesapalOutcome::Reversed => Self::Failed {
                reason: status
                    .payment_status_description
                    .clone()
                    .or_else(|| status.message.clone()),
            },
            PesapalOutcome::Pending | PesapalOutcome::Unknown => Self::Pending,
        }
    }
}

/// Subscription state written on successful payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionActivation {
    /// Tier purchased.
    pub tier: SubscriptionTier,
    /// Period start (the payment time).
    pub period_start: DateTime<Utc>,
    /// Period end.
    pub period_end: DateTime<Utc>,
}

impl SubscriptionActivation {
    /// A fresh billing period starting at `start`.
    #[must_use]
    pub fn starting(tier: SubscriptionTier, start: DateTime<Utc>) -> Self {
        Self {
            tier,
            period_start: start,
            period_end: start + Duration::days(BILLING_PERIOD_DAYS),
        }
    }
}

/// Why a callback changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The transaction already reached `status`.
    AlreadySettled(TransactionStatus),
    /// The provider has no final result yet.
    StillPending,
}

/// What to do with a transaction in response to a provider result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementPlan {
    /// Leave everything as is.
    Skip {
        /// Reason.
        reason: SkipReason,
    },
    /// Mark completed and activate the subscription.
    Complete {
        /// Receipt / confirmation code.
        receipt: Option<String>,
        /// Payment time.
        paid_at: DateTime<Utc>,
        /// Subscription state to upsert.
        activation: SubscriptionActivation,
    },
    /// Mark failed.
    Fail {
        /// Stored on the transaction and sent to the customer.
        error_message: String,
    },
}

impl SettlementPlan {
    /// Returns true if the plan writes anything.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        !matches!(self, Self::Skip { .. })
    }
}

/// Plans the settlement of a transaction.
///
/// `charged` is the stored transaction amount. A payment below the tier's
/// price fails instead of activating the tier. `now` stands in for the
/// payment time when the provider reports none.
#[must_use]
pub fn plan_settlement(
    current: TransactionStatus,
    result: &ProviderResult,
    tier: SubscriptionTier,
    charged: Money,
    now: DateTime<Utc>,
) -> SettlementPlan {
    if current != TransactionStatus::Pending {
        return SettlementPlan::Skip {
            reason: SkipReason::AlreadySettled(current),
        };
    }

    match result {
        ProviderResult::Paid { .. }
            if tier.plan().is_some_and(|plan| !plan.covers(charged)) =>
        {
            SettlementPlan::Fail {
                error_message: format!(
                    "Amount paid ({}) is below the {} plan price",
                    charged.display(),
                    tier.as_str()
                ),
            }
        }
        ProviderResult::Paid { receipt, paid_at } => {
            let paid_at = paid_at.unwrap_or(now);
            SettlementPlan::Complete {
                receipt: receipt.clone(),
                paid_at,
                activation: SubscriptionActivation::starting(tier, paid_at),
            }
        }
        ProviderResult::Failed { reason } => SettlementPlan::Fail {
            error_message: reason
                .clone()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| "Payment failed".to_string()),
        },
        ProviderResult::Pending => SettlementPlan::Skip {
            reason: SkipReason::StillPending,
        },
    }
}

/// Checks that a transaction can be refunded.
///
/// # Errors
///
/// Returns `SettlementError::InvalidTransition` unless the transaction is completed.
pub fn ensure_refundable(current: TransactionStatus) -> Result<(), SettlementError> {
    if current.can_transition_to(TransactionStatus::Refunded) {
        Ok(())
    } else {
        Err(SettlementError::InvalidTransition {
            from: current,
            to: TransactionStatus::Refunded,
        })
    }
}
