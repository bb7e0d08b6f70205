//! `SeaORM` Entity for the `transaction` table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{PaymentMethod, SubscriptionTier, TransactionStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_name = "userId")]
    pub user_id: Uuid,
    #[sea_orm(column_name = "subscriptionId")]
    pub subscription_id: Option<Uuid>,
    #[sea_orm(column_name = "paymentMethod")]
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    /// Smallest currency unit: cents for USD, whole shillings for KES.
    pub amount: i32,
    pub currency: String,
    pub tier: SubscriptionTier,
    #[sea_orm(column_name = "stripePaymentIntentId")]
    pub stripe_payment_intent_id: Option<String>,
    #[sea_orm(column_name = "pesapalOrderTrackingId")]
    pub pesapal_order_tracking_id: Option<String>,
    #[sea_orm(column_name = "pesapalMerchantReference")]
    pub pesapal_merchant_reference: Option<String>,
    #[sea_orm(column_name = "pesapalConfirmationCode")]
    pub pesapal_confirmation_code: Option<String>,
    #[sea_orm(column_name = "mpesaCheckoutRequestId")]
    pub mpesa_checkout_request_id: Option<String>,
    #[sea_orm(column_name = "mpesaMerchantRequestId")]
    pub mpesa_merchant_request_id: Option<String>,
    #[sea_orm(column_name = "mpesaReceiptNumber")]
    pub mpesa_receipt_number: Option<String>,
    #[sea_orm(column_name = "customerEmail")]
    pub customer_email: Option<String>,
    #[sea_orm(column_name = "customerPhone")]
    pub customer_phone: Option<String>,
    #[sea_orm(column_name = "customerName")]
    pub customer_name: Option<String>,
    pub metadata: Option<Json>,
    #[sea_orm(column_name = "errorMessage")]
    pub error_message: Option<String>,
    #[sea_orm(column_name = "paidAt")]
    pub paid_at: Option<DateTime>,
    #[sea_orm(column_name = "refundedAt")]
    pub refunded_at: Option<DateTime>,
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
        belongs_to = "super::subscription::Entity",
        from = "Column::SubscriptionId",
        to = "super::subscription::Column::Id",
        on_delete = "SetNull"
    )]
    Subscription,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscription.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
