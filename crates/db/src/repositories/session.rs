//! Session repository for database operations.
//!
//! A session row backs every issued JWT. Signing out deletes the row, which
//! invalidates the token before it expires.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entities::session;

/// Request details recorded with a session.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Client address.
    pub ip_address: Option<String>,
}

/// Session repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    db: Arc<DatabaseConnection>,
}

impl SessionRepository {
    /// Creates a new session repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Hashes a session token for storage.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Creates a new session with the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        id: Uuid,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
        context: SessionContext,
    ) -> Result<session::Model, DbErr> {
        let now = Utc::now().naive_utc();

        session::ActiveModel {
            id: Set(id.to_string()),
            expires_at: Set(expires_at.naive_utc()),
            token: Set(Self::hash_token(token)),
            created_at: Set(now),
            updated_at: Set(now),
            ip_address: Set(context.ip_address),
            user_agent: Set(context.user_agent),
            user_id: Set(user_id),
        }
        .insert(self.db.as_ref())
        .await
    }

    /// Finds an unexpired session by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active(&self, id: Uuid) -> Result<Option<session::Model>, DbErr> {
        session::Entity::find_by_id(id.to_string())
            .filter(session::Column::ExpiresAt.gt(Utc::now().naive_utc()))
            .one(self.db.as_ref())
            .await
    }

    /// Counts unexpired sessions for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_active_sessions(&self, user_id: Uuid) -> Result<u64, DbErr> {
        session::Entity::find()
            .filter(session::Column::UserId.eq(user_id))
            .filter(session::Column::ExpiresAt.gt(Utc::now().naive_utc()))
            .count(self.db.as_ref())
            .await
    }

    /// Deletes a session. Returns false if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn revoke(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = session::Entity::delete_by_id(id.to_string())
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Deletes every session of a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete_user_sessions<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<u64, DbErr> {
        let result = session::Entity::delete_many()
            .filter(session::Column::UserId.eq(user_id))
            .exec(conn)
            .await?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_hex_sha256() {
        let hash = SessionRepository::hash_token("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
