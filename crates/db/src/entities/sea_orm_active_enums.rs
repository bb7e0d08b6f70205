//! `SeaORM` active enums for the Postgres enum types.

use contentforge_core::{
    auth::UserRole as DomainUserRole, billing::SubscriptionTier as DomainTier,
    content::ContentKind, payments::TransactionStatus as DomainTransactionStatus,
};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "subscription_tier")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[sea_orm(string_value = "free")]
    Free,
    #[sea_orm(string_value = "creator")]
    Creator,
    #[sea_orm(string_value = "pro")]
    Pro,
    #[sea_orm(string_value = "agency")]
    Agency,
    #[sea_orm(string_value = "enterprise")]
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "subscription_status")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "canceled")]
    Canceled,
    #[sea_orm(string_value = "past_due")]
    PastDue,
    #[sea_orm(string_value = "trialing")]
    Trialing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "stripe")]
    Stripe,
    #[sea_orm(string_value = "pesapal")]
    Pesapal,
    #[sea_orm(string_value = "mpesa")]
    Mpesa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "content_type")]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[sea_orm(string_value = "video")]
    Video,
    #[sea_orm(string_value = "audio")]
    Audio,
    #[sea_orm(string_value = "text")]
    Text,
    #[sea_orm(string_value = "podcast")]
    Podcast,
    #[sea_orm(string_value = "webinar")]
    Webinar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "output_type")]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    #[sea_orm(string_value = "linkedin_post")]
    LinkedinPost,
    #[sea_orm(string_value = "twitter_thread")]
    TwitterThread,
    #[sea_orm(string_value = "instagram_caption")]
    InstagramCaption,
    #[sea_orm(string_value = "tiktok_script")]
    TiktokScript,
    #[sea_orm(string_value = "email_newsletter")]
    EmailNewsletter,
    #[sea_orm(string_value = "blog_article")]
    BlogArticle,
    #[sea_orm(string_value = "quote_card")]
    QuoteCard,
    #[sea_orm(string_value = "carousel")]
    Carousel,
}

impl From<UserRole> for DomainUserRole {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::User => Self::User,
            UserRole::Admin => Self::Admin,
        }
    }
}

impl From<SubscriptionTier> for DomainTier {
    fn from(tier: SubscriptionTier) -> Self {
        match tier {
            SubscriptionTier::Free => Self::Free,
            SubscriptionTier::Creator => Self::Creator,
            SubscriptionTier::Pro => Self::Pro,
            SubscriptionTier::Agency => Self::Agency,
            SubscriptionTier::Enterprise => Self::Enterprise,
        }
    }
}

impl From<DomainTier> for SubscriptionTier {
    fn from(tier: DomainTier) -> Self {
        match tier {
            DomainTier::Free => Self::Free,
            DomainTier::Creator => Self::Creator,
            DomainTier::Pro => Self::Pro,
            DomainTier::Agency => Self::Agency,
            DomainTier::Enterprise => Self::Enterprise,
        }
    }
}

impl From<TransactionStatus> for DomainTransactionStatus {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Pending => Self::Pending,
            TransactionStatus::Completed => Self::Completed,
            TransactionStatus::Failed => Self::Failed,
            TransactionStatus::Refunded => Self::Refunded,
        }
    }
}

impl From<DomainTransactionStatus> for TransactionStatus {
    fn from(status: DomainTransactionStatus) -> Self {
        match status {
            DomainTransactionStatus::Pending => Self::Pending,
            DomainTransactionStatus::Completed => Self::Completed,
            DomainTransactionStatus::Failed => Self::Failed,
            DomainTransactionStatus::Refunded => Self::Refunded,
        }
    }
}

impl OutputType {
    /// Column type for generated content. Summaries are not stored as outputs.
    #[must_use]
    pub const fn from_kind(kind: ContentKind) -> Option<Self> {
        match kind {
            ContentKind::LinkedinPost => Some(Self::LinkedinPost),
            ContentKind::TwitterThread => Some(Self::TwitterThread),
            ContentKind::InstagramCaption => Some(Self::InstagramCaption),
            ContentKind::EmailNewsletter => Some(Self::EmailNewsletter),
            ContentKind::BlogArticle => Some(Self::BlogArticle),
            ContentKind::TiktokScript => Some(Self::TiktokScript),
            ContentKind::QuoteCard => Some(Self::QuoteCard),
            ContentKind::Summary => None,
        }
    }
}
