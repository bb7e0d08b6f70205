//! Team and membership repository.

use std::sync::Arc;

use chrono::Utc;
use contentforge_core::auth::TeamRole;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{team, team_member};

/// Error types for team operations.
#[derive(Debug, thiserror::Error)]
pub enum TeamError {
    /// Team not found.
    #[error("Team not found: {0}")]
    NotFound(Uuid),

    /// The user is already on the team.
    #[error("User {0} is already a member of this team")]
    AlreadyMember(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Team repository.
#[derive(Debug, Clone)]
pub struct TeamRepository {
    db: Arc<DatabaseConnection>,
}

impl TeamRepository {
    /// Creates a new team repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a team with `owner_id` as its owner member.
    ///
    /// # Errors
    ///
    /// Returns an error if either insert fails.
    pub async fn create_with_owner(&self, name: &str, owner_id: Uuid) -> Result<team::Model, DbErr> {
        let now = Utc::now().naive_utc();
        let txn = self.db.begin().await?;

        let team = team::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.trim().to_string()),
            owner_id: Set(owner_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        team_member::ActiveModel {
            id: Set(Uuid::new_v4()),
            team_id: Set(team.id),
            user_id: Set(owner_id),
            role: Set(TeamRole::Owner.as_str().to_string()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(team)
    }

    /// Teams the user belongs to, with the user's role in each.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(team::Model, team_member::Model)>, DbErr> {
        team_member::Entity::find()
            .filter(team_member::Column::UserId.eq(user_id))
            .order_by_asc(team_member::Column::CreatedAt)
            .find_also_related(team::Entity)
            .all(self.db.as_ref())
            .await
            .map(|results| {
                results
                    .into_iter()
                    .filter_map(|(member, team)| team.map(|t| (t, member)))
                    .collect()
            })
    }

    /// The user's membership in a team, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_membership(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<team_member::Model>, DbErr> {
        team_member::Entity::find()
            .filter(team_member::Column::TeamId.eq(team_id))
            .filter(team_member::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
    }

    /// Adds a member to a team.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown team, `AlreadyMember` when the user
    /// is on the team, or a database error.
    pub async fn add_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<team_member::Model, TeamError> {
        team::Entity::find_by_id(team_id)
            .one(self.db.as_ref())
            .await?
            .ok_or(TeamError::NotFound(team_id))?;

        if self.find_membership(team_id, user_id).await?.is_some() {
            return Err(TeamError::AlreadyMember(user_id));
        }

        let member = team_member::ActiveModel {
            id: Set(Uuid::new_v4()),
            team_id: Set(team_id),
            user_id: Set(user_id),
            role: Set(role.as_str().to_string()),
            created_at: Set(Utc::now().naive_utc()),
        }
        .insert(self.db.as_ref())
        .await?;

        Ok(member)
    }

    /// Members of a team in join order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_members(&self, team_id: Uuid) -> Result<Vec<team_member::Model>, DbErr> {
        team_member::Entity::find()
            .filter(team_member::Column::TeamId.eq(team_id))
            .order_by_asc(team_member::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
    }
}
