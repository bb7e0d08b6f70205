//! Billing routes: plan catalogue, current subscription, payment history.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{AppState, ApiResult, middleware::AuthUser};
use contentforge_core::billing::{PlanInfo, catalogue};
use contentforge_db::entities::{
    sea_orm_active_enums::{PaymentMethod, SubscriptionStatus, SubscriptionTier},
    subscription, transaction,
};
use contentforge_db::{SubscriptionRepository, TransactionRepository};
use contentforge_shared::types::{PageRequest, PageResponse};

/// Catalogue, no session needed.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/billing/plans", get(plans))
}

/// The caller's billing state.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/billing/subscription", get(current_subscription))
        .route("/billing/transactions", get(transactions))
}

/// Plan catalogue.
#[derive(Debug, Serialize)]
pub struct PlansResponse {
    /// Purchasable plans.
    pub plans: Vec<PlanInfo>,
}

async fn plans() -> Json<PlansResponse> {
    Json(PlansResponse { plans: catalogue() })
}

/// The caller's subscription. Users who never paid see an active free tier.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    /// Tier.
    pub tier: SubscriptionTier,
    /// Status.
    pub status: SubscriptionStatus,
    /// How the last period was paid.
    pub payment_method: Option<PaymentMethod>,
    /// Start of the paid period.
    pub current_period_start: Option<NaiveDateTime>,
    /// End of the paid period.
    pub current_period_end: Option<NaiveDateTime>,
    /// Whether the plan lapses at period end.
    pub cancel_at_period_end: bool,
}

impl SubscriptionView {
    fn free() -> Self {
        Self {
            tier: SubscriptionTier::Free,
            status: SubscriptionStatus::Active,
            payment_method: None,
            current_period_start: None,
            current_period_end: None,
            cancel_at_period_end: false,
        }
    }
}

impl From<subscription::Model> for SubscriptionView {
    fn from(model: subscription::Model) -> Self {
        Self {
            tier: model.tier,
            status: model.status,
            payment_method: model.payment_method,
            current_period_start: model.current_period_start,
            current_period_end: model.current_period_end,
            cancel_at_period_end: model.cancel_at_period_end.unwrap_or(false),
        }
    }
}

/// GET /billing/subscription
async fn current_subscription(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<SubscriptionView>> {
    let view = SubscriptionRepository::new(state.conn())
        .find_by_user(auth.user_id())
        .await?
        .map_or_else(SubscriptionView::free, SubscriptionView::from);

    Ok(Json(view))
}

/// GET /billing/transactions?page&per_page
async fn transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<transaction::Model>>> {
    let page = page.normalized();
    let (rows, total) = TransactionRepository::new(state.conn())
        .list_by_user(auth.user_id(), &page)
        .await?;

    Ok(Json(PageResponse::new(rows, &page, total)))
}
