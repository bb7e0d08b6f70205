//! Credential account repository.
//!
//! Passwords live on the `account` row with provider `credential`, one per user.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use super::session::SessionRepository;
use crate::entities::account;

/// Provider id for email + password accounts.
pub const CREDENTIAL_PROVIDER: &str = "credential";

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: Arc<DatabaseConnection>,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Inserts the credential account for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create_credential<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<account::Model, DbErr> {
        let now = chrono::Utc::now().naive_utc();
        account::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(user_id.to_string()),
            provider_id: Set(CREDENTIAL_PROVIDER.to_string()),
            user_id: Set(user_id),
            access_token: Set(None),
            refresh_token: Set(None),
            id_token: Set(None),
            access_token_expires_at: Set(None),
            refresh_token_expires_at: Set(None),
            scope: Set(None),
            password: Set(Some(password_hash.to_string())),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
    }

    /// Finds the credential account for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_credential(&self, user_id: Uuid) -> Result<Option<account::Model>, DbErr> {
        account::Entity::find()
            .filter(account::Column::UserId.eq(user_id))
            .filter(account::Column::ProviderId.eq(CREDENTIAL_PROVIDER))
            .one(self.db.as_ref())
            .await
    }

    /// Replaces the password hash and signs the user out everywhere.
    ///
    /// Returns false if the user has no credential account; nothing changes then.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn reset_password(&self, user_id: Uuid, password_hash: &str) -> Result<bool, DbErr> {
        let txn = self.db.begin().await?;

        let result = account::Entity::update_many()
            .col_expr(
                account::Column::Password,
                sea_orm::sea_query::Expr::value(password_hash),
            )
            .col_expr(
                account::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now().naive_utc()),
            )
            .filter(account::Column::UserId.eq(user_id))
            .filter(account::Column::ProviderId.eq(CREDENTIAL_PROVIDER))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        let revoked = SessionRepository::delete_user_sessions(&txn, user_id).await?;
        txn.commit().await?;

        tracing::info!(%user_id, revoked, "Password reset");
        Ok(true)
    }
}
