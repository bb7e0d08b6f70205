//! `SeaORM` Entity for the `subscription` table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{PaymentMethod, SubscriptionStatus, SubscriptionTier};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_name = "userId")]
    pub user_id: Uuid,
    #[sea_orm(column_name = "stripeCustomerId", unique)]
    pub stripe_customer_id: Option<String>,
    #[sea_orm(column_name = "stripeSubscriptionId", unique)]
    pub stripe_subscription_id: Option<String>,
    #[sea_orm(column_name = "paymentMethod")]
    pub payment_method: Option<PaymentMethod>,
    pub tier: SubscriptionTier,
    pub status: SubscriptionStatus,
    #[sea_orm(column_name = "currentPeriodStart")]
    pub current_period_start: Option<DateTime>,
    #[sea_orm(column_name = "currentPeriodEnd")]
    pub current_period_end: Option<DateTime>,
    #[sea_orm(column_name = "cancelAtPeriodEnd")]
    pub cancel_at_period_end: Option<bool>,
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
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transaction,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
