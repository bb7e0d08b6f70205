//! User repository for database operations.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use super::account::AccountRepository;
use crate::entities::{sea_orm_active_enums::UserRole, user};

/// Error types for user creation.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// Another account holds the email.
    #[error("An account with this email already exists")]
    EmailTaken,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl UserError {
    /// Classifies a failed user insert. The unique index on `email` turns a
    /// signup that lost the race against another into `EmailTaken`.
    #[must_use]
    pub fn from_insert(err: DbErr) -> Self {
        Self::classify(err.sql_err(), err)
    }

    fn classify(sql: Option<SqlErr>, err: DbErr) -> Self {
        match sql {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::EmailTaken,
            _ => Self::Database(err),
        }
    }
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Normalises an email address for lookups and storage.
    #[must_use]
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find()
            .filter(user::Column::Email.eq(Self::normalize_email(email)))
            .one(self.db.as_ref())
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find_by_id(id).one(self.db.as_ref()).await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = user::Entity::find()
            .filter(user::Column::Email.eq(Self::normalize_email(email)))
            .count(self.db.as_ref())
            .await?;

        Ok(count > 0)
    }

    /// Creates an unverified user together with its credential account.
    ///
    /// # Errors
    ///
    /// Returns `EmailTaken` when the email is already registered, or a
    /// database error if either insert fails.
    pub async fn create_with_credential(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<user::Model, UserError> {
        let txn = self.db.begin().await?;

        let user = Self::insert(&txn, name, email)
            .await
            .map_err(UserError::from_insert)?;
        AccountRepository::create_credential(&txn, user.id, password_hash).await?;

        txn.commit().await?;
        Ok(user)
    }

    /// Inserts an unverified user with the `user` role.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        name: &str,
        email: &str,
    ) -> Result<user::Model, DbErr> {
        let now = chrono::Utc::now().naive_utc();
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.trim().to_string()),
            email: Set(Self::normalize_email(email)),
            email_verified: Set(false),
            image: Set(None),
            role: Set(UserRole::User),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
    }

    /// Marks a user's email as verified and returns the updated row.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if the user does not exist.
    pub async fn mark_email_verified(&self, id: Uuid) -> Result<user::Model, DbErr> {
        let user = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("user {id}")))?;

        let mut active: user::ActiveModel = user.into();
        active.email_verified = Set(true);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(self.db.as_ref()).await
    }
}
