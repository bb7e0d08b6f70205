//! Brand profile repository.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::brand;

/// Input for creating a brand.
#[derive(Debug, Clone, Default)]
pub struct NewBrand {
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Voice characteristics used in generation prompts.
    pub voice_profile: Option<serde_json::Value>,
    /// Colors, fonts, logo.
    pub visual_identity: Option<serde_json::Value>,
    /// Industry.
    pub industry: Option<String>,
    /// Target audience.
    pub target_audience: Option<String>,
}

/// Brand repository. Every query is scoped to the owning user.
#[derive(Debug, Clone)]
pub struct BrandRepository {
    db: Arc<DatabaseConnection>,
}

impl BrandRepository {
    /// Creates a new brand repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a brand owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, user_id: Uuid, input: NewBrand) -> Result<brand::Model, DbErr> {
        let now = Utc::now().naive_utc();
        brand::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(input.name),
            description: Set(input.description),
            voice_profile: Set(input.voice_profile),
            visual_identity: Set(input.visual_identity),
            industry: Set(input.industry),
            target_audience: Set(input.target_audience),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await
    }

    /// Lists a user's brands, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<brand::Model>, DbErr> {
        brand::Entity::find()
            .filter(brand::Column::UserId.eq(user_id))
            .order_by_desc(brand::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
    }

    /// Finds a brand owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<brand::Model>, DbErr> {
        brand::Entity::find_by_id(id)
            .filter(brand::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
    }

    /// Deletes a brand owned by `user_id`. Returns false if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<bool, DbErr> {
        let result = brand::Entity::delete_many()
            .filter(brand::Column::Id.eq(id))
            .filter(brand::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected > 0)
    }
}
