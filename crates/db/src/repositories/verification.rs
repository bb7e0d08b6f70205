//! Verification token repository (email verification and password reset).

use std::sync::Arc;

use chrono::{Duration, Utc};
use contentforge_core::auth::generate_token;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::session::SessionRepository;
use crate::entities::verification;

/// What a verification token proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationPurpose {
    /// Ownership of the registered email address.
    EmailVerification,
    /// Permission to set a new password.
    PasswordReset,
}

impl VerificationPurpose {
    const fn prefix(self) -> &'static str {
        match self {
            Self::EmailVerification => "email-verification",
            Self::PasswordReset => "password-reset",
        }
    }

    /// Row identifier for a user.
    #[must_use]
    pub fn identifier(self, user_id: Uuid) -> String {
        format!("{}:{user_id}", self.prefix())
    }

    /// Extracts the user id from an identifier of this purpose.
    #[must_use]
    pub fn user_id(self, identifier: &str) -> Option<Uuid> {
        identifier
            .strip_prefix(self.prefix())
            .and_then(|rest| rest.strip_prefix(':'))
            .and_then(|id| Uuid::parse_str(id).ok())
    }
}

/// Verification repository.
#[derive(Debug, Clone)]
pub struct VerificationRepository {
    db: Arc<DatabaseConnection>,
}

impl VerificationRepository {
    /// Creates a new verification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Issues a token for a user, replacing any earlier token of the same purpose.
    /// Returns the raw token to be emailed; only its hash is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn issue(
        &self,
        purpose: VerificationPurpose,
        user_id: Uuid,
        ttl: Duration,
    ) -> Result<String, DbErr> {
        let identifier = purpose.identifier(user_id);
        let raw_token = generate_token();
        let now = Utc::now();

        let txn = self.db.begin().await?;

        verification::Entity::delete_many()
            .filter(verification::Column::Identifier.eq(&identifier))
            .exec(&txn)
            .await?;

        verification::ActiveModel {
            id: Set(Uuid::new_v4()),
            identifier: Set(identifier),
            value: Set(SessionRepository::hash_token(&raw_token)),
            expires_at: Set((now + ttl).naive_utc()),
            created_at: Set(Some(now.naive_utc())),
            updated_at: Set(Some(now.naive_utc())),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(raw_token)
    }

    /// Consumes a token. Returns the user it was issued to, or `None` when the
    /// token is unknown, expired, or belongs to another purpose.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn consume(
        &self,
        purpose: VerificationPurpose,
        raw_token: &str,
    ) -> Result<Option<Uuid>, DbErr> {
        let row = verification::Entity::find()
            .filter(verification::Column::Value.eq(SessionRepository::hash_token(raw_token)))
            .filter(verification::Column::Identifier.starts_with(purpose.prefix()))
            .one(self.db.as_ref())
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        verification::Entity::delete_by_id(row.id)
            .exec(self.db.as_ref())
            .await?;

        if row.expires_at <= Utc::now().naive_utc() {
            return Ok(None);
        }

        Ok(purpose.user_id(&row.identifier))
    }
}
