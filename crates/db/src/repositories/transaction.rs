//! Payment transaction repository.
//!
//! Rows are created pending when a checkout starts and settled once by the
//! provider's callback, IPN, or a status check. Settlement locks the row, so
//! concurrent deliveries of the same callback settle it exactly once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use contentforge_core::payments::{
    ProviderResult, SettlementError, SettlementPlan, TransactionStatus as DomainStatus,
    ensure_refundable, plan_settlement,
};
use contentforge_shared::types::{Currency, Money, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::subscription::SubscriptionRepository;
use crate::entities::{
    sea_orm_active_enums::{PaymentMethod, SubscriptionTier, TransactionStatus},
    subscription, transaction,
};

/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    NotFound(Uuid),

    /// The status change is not allowed.
    #[error(transparent)]
    Settlement(#[from] SettlementError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for a new pending transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Paying user.
    pub user_id: Uuid,
    /// Provider.
    pub payment_method: PaymentMethod,
    /// Smallest currency unit.
    pub amount: i32,
    /// ISO currency code.
    pub currency: String,
    /// Tier being bought.
    pub tier: SubscriptionTier,
    /// Customer email.
    pub customer_email: Option<String>,
    /// Customer phone (MSISDN for M-Pesa).
    pub customer_phone: Option<String>,
    /// Customer display name.
    pub customer_name: Option<String>,
    /// M-Pesa `CheckoutRequestID`.
    pub mpesa_checkout_request_id: Option<String>,
    /// M-Pesa `MerchantRequestID`.
    pub mpesa_merchant_request_id: Option<String>,
    /// Pesapal `order_tracking_id`.
    pub pesapal_order_tracking_id: Option<String>,
    /// Pesapal `merchant_reference`.
    pub pesapal_merchant_reference: Option<String>,
    /// Free-form provider details.
    pub metadata: Option<serde_json::Value>,
}

impl NewTransaction {
    /// A pending transaction with no provider references yet.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        payment_method: PaymentMethod,
        amount: i32,
        currency: impl Into<String>,
        tier: SubscriptionTier,
    ) -> Self {
        Self {
            user_id,
            payment_method,
            amount,
            currency: currency.into(),
            tier,
            customer_email: None,
            customer_phone: None,
            customer_name: None,
            mpesa_checkout_request_id: None,
            mpesa_merchant_request_id: None,
            pesapal_order_tracking_id: None,
            pesapal_merchant_reference: None,
            metadata: None,
        }
    }
}

/// Result of settling a transaction.
#[derive(Debug, Clone)]
pub struct Settlement {
    /// What was decided.
    pub plan: SettlementPlan,
    /// The transaction after the write (unchanged on skip).
    pub transaction: transaction::Model,
    /// The activated subscription, on completion.
    pub subscription: Option<subscription::Model>,
}

/// The stored amount. Rows are only written in KES or USD.
fn charged(row: &transaction::Model) -> Money {
    let currency = row.currency.parse().unwrap_or(Currency::Usd);
    Money::new(i64::from(row.amount), currency)
}

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: Arc<DatabaseConnection>,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Stores a pending transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create_pending(&self, input: NewTransaction) -> Result<transaction::Model, DbErr> {
        let now = Utc::now().naive_utc();

        transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            subscription_id: Set(None),
            payment_method: Set(input.payment_method),
            status: Set(TransactionStatus::Pending),
            amount: Set(input.amount),
            currency: Set(input.currency),
            tier: Set(input.tier),
            stripe_payment_intent_id: Set(None),
            pesapal_order_tracking_id: Set(input.pesapal_order_tracking_id),
            pesapal_merchant_reference: Set(input.pesapal_merchant_reference),
            pesapal_confirmation_code: Set(None),
            mpesa_checkout_request_id: Set(input.mpesa_checkout_request_id),
            mpesa_merchant_request_id: Set(input.mpesa_merchant_request_id),
            mpesa_receipt_number: Set(None),
            customer_email: Set(input.customer_email),
            customer_phone: Set(input.customer_phone),
            customer_name: Set(input.customer_name),
            metadata: Set(input.metadata),
            error_message: Set(None),
            paid_at: Set(None),
            refunded_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await
    }

    /// Finds a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<transaction::Model>, DbErr> {
        transaction::Entity::find_by_id(id).one(self.db.as_ref()).await
    }

    /// Finds the transaction for an STK push.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<transaction::Model>, DbErr> {
        transaction::Entity::find()
            .filter(transaction::Column::MpesaCheckoutRequestId.eq(checkout_request_id))
            .one(self.db.as_ref())
            .await
    }

    /// Finds the transaction for a Pesapal order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_order_tracking_id(
        &self,
        order_tracking_id: &str,
    ) -> Result<Option<transaction::Model>, DbErr> {
        transaction::Entity::find()
            .filter(transaction::Column::PesapalOrderTrackingId.eq(order_tracking_id))
            .one(self.db.as_ref())
            .await
    }

    /// Finds a Pesapal transaction by our merchant reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_merchant_reference(
        &self,
        merchant_reference: &str,
    ) -> Result<Option<transaction::Model>, DbErr> {
        transaction::Entity::find()
            .filter(transaction::Column::PesapalMerchantReference.eq(merchant_reference))
            .one(self.db.as_ref())
            .await
    }

    /// Applies a provider result to a transaction.
    ///
    /// The row is locked, the settlement planned against its current status
    /// and stored amount, and on completion the user's subscription is
    /// activated in the same database transaction. A row charged less than
    /// its tier's price is failed. `metadata`, when given, replaces the stored
    /// provider details.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the transaction does not exist, or a database error.
    pub async fn settle(
        &self,
        id: Uuid,
        result: &ProviderResult,
        metadata: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<Settlement, TransactionError> {
        let txn = self.db.begin().await?;

        let row = transaction::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(TransactionError::NotFound(id))?;

        let plan = plan_settlement(
            row.status.into(),
            result,
            row.tier.into(),
            charged(&row),
            now,
        );

        let (transaction, subscription) = match &plan {
            SettlementPlan::Skip { .. } => {
                txn.rollback().await?;
                return Ok(Settlement {
                    plan,
                    transaction: row,
                    subscription: None,
                });
            }
            SettlementPlan::Complete {
                receipt,
                paid_at,
                activation,
            } => {
                let subscription = SubscriptionRepository::activate(
                    &txn,
                    row.user_id,
                    row.payment_method,
                    activation,
                )
                .await?;

                let method = row.payment_method;
                let mut active: transaction::ActiveModel = row.into();
                active.status = Set(TransactionStatus::Completed);
                active.paid_at = Set(Some(paid_at.naive_utc()));
                active.subscription_id = Set(Some(subscription.id));
                active.error_message = Set(None);
                match method {
                    PaymentMethod::Mpesa => active.mpesa_receipt_number = Set(receipt.clone()),
                    PaymentMethod::Pesapal => {
                        active.pesapal_confirmation_code = Set(receipt.clone());
                    }
                    PaymentMethod::Stripe => {}
                }
                if metadata.is_some() {
                    active.metadata = Set(metadata);
                }
                active.updated_at = Set(now.naive_utc());

                (active.update(&txn).await?, Some(subscription))
            }
            SettlementPlan::Fail { error_message } => {
                let mut active: transaction::ActiveModel = row.into();
                active.status = Set(TransactionStatus::Failed);
                active.error_message = Set(Some(error_message.clone()));
                if metadata.is_some() {
                    active.metadata = Set(metadata);
                }
                active.updated_at = Set(now.naive_utc());

                (active.update(&txn).await?, None)
            }
        };

        txn.commit().await?;

        tracing::info!(
            transaction_id = %transaction.id,
            status = %DomainStatus::from(transaction.status),
            "Transaction settled"
        );

        Ok(Settlement {
            plan,
            transaction,
            subscription,
        })
    }

    /// Marks a completed transaction refunded.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Settlement` if the transaction is not completed,
    /// or a database error.
    pub async fn mark_refunded(&self, id: Uuid) -> Result<transaction::Model, TransactionError> {
        let row = self
            .find_by_id(id)
            .await?
            .ok_or(TransactionError::NotFound(id))?;

        ensure_refundable(row.status.into())?;

        let now = Utc::now().naive_utc();
        let mut active: transaction::ActiveModel = row.into();
        active.status = Set(TransactionStatus::Refunded);
        active.refunded_at = Set(Some(now));
        active.updated_at = Set(now);

        Ok(active.update(self.db.as_ref()).await?)
    }

    /// Lists a user's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> Result<(Vec<transaction::Model>, u64), DbErr> {
        let paginator = transaction::Entity::find()
            .filter(transaction::Column::UserId.eq(user_id))
            .order_by_desc(transaction::Column::CreatedAt)
            .paginate(self.db.as_ref(), page.limit());

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.page_index()).await?;

        Ok((rows, total))
    }
}
