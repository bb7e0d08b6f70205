//! Subscription repository.
//!
//! Each user has at most one subscription row. Paying for a plan upserts it.
//! The schema has no unique key on `userId`, so writers first lock the
//! owning `user` row. Concurrent activations for one user then run one after
//! the other and the second finds the row the first inserted.

use std::sync::Arc;

use chrono::Utc;
use contentforge_core::payments::SubscriptionActivation;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    sea_orm_active_enums::{PaymentMethod, SubscriptionStatus, SubscriptionTier},
    subscription, user,
};

/// Repository for subscription operations.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    /// Creates a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds the subscription of a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<subscription::Model>, DbErr> {
        Self::find_for_user(self.db.as_ref(), user_id).await
    }

    /// Takes the per-user write lock for the rest of the database transaction.
    async fn lock_user<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> Result<(), DbErr> {
        user::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(conn)
            .await?
            .map(|_| ())
            .ok_or_else(|| DbErr::RecordNotFound(format!("user {user_id}")))
    }

    async fn find_for_user<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<Option<subscription::Model>, DbErr> {
        subscription::Entity::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .order_by_desc(subscription::Column::UpdatedAt)
            .one(conn)
            .await
    }

    /// Gives a user an active free subscription unless one exists already.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn ensure_free(&self, user_id: Uuid) -> Result<subscription::Model, DbErr> {
        let txn = self.db.begin().await?;
        Self::lock_user(&txn, user_id).await?;

        if let Some(existing) = Self::find_for_user(&txn, user_id).await? {
            txn.commit().await?;
            return Ok(existing);
        }

        let now = Utc::now().naive_utc();
        let created = subscription::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            stripe_customer_id: Set(None),
            stripe_subscription_id: Set(None),
            payment_method: Set(None),
            tier: Set(SubscriptionTier::Free),
            status: Set(SubscriptionStatus::Active),
            current_period_start: Set(None),
            current_period_end: Set(None),
            cancel_at_period_end: Set(Some(false)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(created)
    }

    /// Activates a paid period for a user, updating the existing row or inserting one.
    ///
    /// `conn` must be a database transaction; the user row stays locked until
    /// it ends.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if the user does not exist, or an error if the
    /// database write fails.
    pub async fn activate<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        method: PaymentMethod,
        activation: &SubscriptionActivation,
    ) -> Result<subscription::Model, DbErr> {
        let now = Utc::now().naive_utc();
        let tier = SubscriptionTier::from(activation.tier);
        let period_start = activation.period_start.naive_utc();
        let period_end = activation.period_end.naive_utc();

        Self::lock_user(conn, user_id).await?;
        if let Some(existing) = Self::find_for_user(conn, user_id).await? {
            let mut active: subscription::ActiveModel = existing.into();
            active.payment_method = Set(Some(method));
            active.tier = Set(tier);
            active.status = Set(SubscriptionStatus::Active);
            active.current_period_start = Set(Some(period_start));
            active.current_period_end = Set(Some(period_end));
            active.cancel_at_period_end = Set(Some(false));
            active.updated_at = Set(now);
            return active.update(conn).await;
        }

        subscription::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            stripe_customer_id: Set(None),
            stripe_subscription_id: Set(None),
            payment_method: Set(Some(method)),
            tier: Set(tier),
            status: Set(SubscriptionStatus::Active),
            current_period_start: Set(Some(period_start)),
            current_period_end: Set(Some(period_end)),
            cancel_at_period_end: Set(Some(false)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
    }
}
