//! Generated output repository.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{output, sea_orm_active_enums::OutputType};

/// One generated piece to store.
#[derive(Debug, Clone)]
pub struct NewOutput {
    /// Output type.
    pub output_type: OutputType,
    /// Optional headline.
    pub title: Option<String>,
    /// Generated text.
    pub content: String,
}

/// Output repository.
#[derive(Debug, Clone)]
pub struct OutputRepository {
    db: Arc<DatabaseConnection>,
}

impl OutputRepository {
    /// Creates a new output repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Stores a batch of outputs for a project atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is stored then.
    pub async fn create_many(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        outputs: Vec<NewOutput>,
    ) -> Result<Vec<output::Model>, DbErr> {
        let now = Utc::now().naive_utc();
        let txn = self.db.begin().await?;

        let mut stored = Vec::with_capacity(outputs.len());
        for item in outputs {
            let model = output::ActiveModel {
                id: Set(Uuid::new_v4()),
                project_id: Set(project_id),
                user_id: Set(user_id),
                output_type: Set(item.output_type),
                title: Set(item.title),
                content: Set(item.content),
                metadata: Set(None),
                published_at: Set(None),
                scheduled_for: Set(None),
                analytics: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?;
            stored.push(model);
        }

        txn.commit().await?;
        Ok(stored)
    }

    /// Lists a project's outputs in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_project(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<output::Model>, DbErr> {
        output::Entity::find()
            .filter(output::Column::ProjectId.eq(project_id))
            .filter(output::Column::UserId.eq(user_id))
            .order_by_asc(output::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
    }
}
