//! `SeaORM` Entity for the `project` table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ContentType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_name = "userId")]
    pub user_id: Uuid,
    #[sea_orm(column_name = "brandId")]
    pub brand_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    #[sea_orm(column_name = "contentType")]
    pub content_type: ContentType,
    #[sea_orm(column_name = "sourceUrl")]
    pub source_url: Option<String>,
    #[sea_orm(column_name = "fileUrl")]
    pub file_url: Option<String>,
    /// Bytes.
    #[sea_orm(column_name = "fileSize")]
    pub file_size: Option<i32>,
    /// Seconds.
    pub duration: Option<i32>,
    #[sea_orm(column_name = "transcriptUrl")]
    pub transcript_url: Option<String>,
    #[sea_orm(column_name = "transcriptText")]
    pub transcript_text: Option<String>,
    pub metadata: Option<Json>,
    /// `pending`, `processing`, `completed` or `failed`.
    #[sea_orm(column_name = "processingStatus")]
    pub processing_status: String,
    #[sea_orm(column_name = "processingError")]
    pub processing_error: Option<String>,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::brand::Entity",
        from = "Column::BrandId",
        to = "super::brand::Column::Id",
        on_delete = "SetNull"
    )]
    Brand,
    #[sea_orm(has_many = "super::output::Entity")]
    Output,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::brand::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brand.def()
    }
}

impl Related<super::output::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Output.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
