//! Content project repository.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{project, sea_orm_active_enums::ContentType};

/// Values of the free-text `processingStatus` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    /// Uploaded, nothing run yet.
    Pending,
    /// Transcription running.
    Processing,
    /// Transcript stored.
    Completed,
    /// Transcription failed; see `processingError`.
    Failed,
}

impl ProcessingStatus {
    /// Column value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Input for creating a project.
#[derive(Debug, Clone)]
pub struct NewProject {
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Media kind.
    pub content_type: ContentType,
    /// External link (YouTube, Vimeo).
    pub source_url: Option<String>,
    /// Uploaded file URL.
    pub file_url: Option<String>,
    /// Uploaded file size in bytes.
    pub file_size: Option<i32>,
    /// Brand to write in the voice of.
    pub brand_id: Option<Uuid>,
}

/// Project repository. Lookups are scoped to the owning user.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    db: Arc<DatabaseConnection>,
}

impl ProjectRepository {
    /// Creates a new project repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a pending project.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, user_id: Uuid, input: NewProject) -> Result<project::Model, DbErr> {
        let now = Utc::now().naive_utc();
        project::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            brand_id: Set(input.brand_id),
            title: Set(input.title),
            description: Set(input.description),
            content_type: Set(input.content_type),
            source_url: Set(input.source_url),
            file_url: Set(input.file_url),
            file_size: Set(input.file_size),
            duration: Set(None),
            transcript_url: Set(None),
            transcript_text: Set(None),
            metadata: Set(None),
            processing_status: Set(ProcessingStatus::Pending.as_str().to_string()),
            processing_error: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await
    }

    /// Lists a user's projects, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<project::Model>, DbErr> {
        project::Entity::find()
            .filter(project::Column::UserId.eq(user_id))
            .order_by_desc(project::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
    }

    /// Finds a project owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_owned(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<project::Model>, DbErr> {
        project::Entity::find_by_id(id)
            .filter(project::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
    }

    /// Sets the processing status, clearing any earlier error.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_status(
        &self,
        project: project::Model,
        status: ProcessingStatus,
    ) -> Result<project::Model, DbErr> {
        let mut active: project::ActiveModel = project.into();
        active.processing_status = Set(status.as_str().to_string());
        active.processing_error = Set(None);
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(self.db.as_ref()).await
    }

    /// Stores a finished transcript and marks the project completed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn store_transcript(
        &self,
        project: project::Model,
        transcript: String,
        duration_seconds: Option<i32>,
        metadata: Option<serde_json::Value>,
    ) -> Result<project::Model, DbErr> {
        let mut active: project::ActiveModel = project.into();
        active.transcript_text = Set(Some(transcript));
        active.duration = Set(duration_seconds);
        if metadata.is_some() {
            active.metadata = Set(metadata);
        }
        active.processing_status = Set(ProcessingStatus::Completed.as_str().to_string());
        active.processing_error = Set(None);
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(self.db.as_ref()).await
    }

    /// Marks the project failed with a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_failed(
        &self,
        project: project::Model,
        error: &str,
    ) -> Result<project::Model, DbErr> {
        let mut active: project::ActiveModel = project.into();
        active.processing_status = Set(ProcessingStatus::Failed.as_str().to_string());
        active.processing_error = Set(Some(error.to_string()));
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(self.db.as_ref()).await
    }
}
