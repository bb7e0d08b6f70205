//! Integration tests for transactions, settlement and subscriptions.

mod common;

use chrono::{Duration, TimeZone, Utc};
use contentforge_core::payments::{ProviderResult, SettlementPlan, SkipReason, TransactionStatus as Domain};
use contentforge_db::{
    SubscriptionRepository, TransactionRepository,
    entities::sea_orm_active_enums::{
        PaymentMethod, SubscriptionStatus, SubscriptionTier, TransactionStatus,
    },
    repositories::{NewTransaction, TransactionError},
};
use contentforge_shared::types::PageRequest;
use uuid::Uuid;

fn mpesa_checkout(user_id: Uuid, checkout_id: &str) -> NewTransaction {
    NewTransaction {
        customer_phone: Some("254712345678".to_string()),
        mpesa_checkout_request_id: Some(checkout_id.to_string()),
        mpesa_merchant_request_id: Some(format!("merchant-{checkout_id}")),
        ..NewTransaction::new(
            user_id,
            PaymentMethod::Mpesa,
            25_000,
            "KES",
            SubscriptionTier::Pro,
        )
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_mpesa_settlement_activates_subscription() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = TransactionRepository::new(db.clone());
    let checkout_id = format!("ws_CO_{}", Uuid::new_v4().simple());

    let pending = repo
        .create_pending(mpesa_checkout(user.id, &checkout_id))
        .await
        .expect("Failed to create transaction");
    assert_eq!(pending.status, TransactionStatus::Pending);

    let found = repo
        .find_by_checkout_request_id(&checkout_id)
        .await
        .unwrap()
        .expect("Transaction should be found by checkout id");
    assert_eq!(found.id, pending.id);

    let paid_at = Utc.with_ymd_and_hms(2024, 2, 15, 7, 30, 0).unwrap();
    let settlement = repo
        .settle(
            pending.id,
            &ProviderResult::Paid {
                receipt: Some("NLJ7RT61SV".to_string()),
                paid_at: Some(paid_at),
            },
            Some(serde_json::json!({ "phone": "254712345678" })),
            Utc::now(),
        )
        .await
        .expect("Failed to settle");

    assert!(matches!(settlement.plan, SettlementPlan::Complete { .. }));
    assert_eq!(settlement.transaction.status, TransactionStatus::Completed);
    assert_eq!(
        settlement.transaction.mpesa_receipt_number.as_deref(),
        Some("NLJ7RT61SV")
    );
    assert_eq!(settlement.transaction.paid_at, Some(paid_at.naive_utc()));

    let subscription = settlement.subscription.expect("Subscription should be activated");
    assert_eq!(settlement.transaction.subscription_id, Some(subscription.id));
    assert_eq!(subscription.tier, SubscriptionTier::Pro);
    assert_eq!(subscription.status, SubscriptionStatus::Active);
    assert_eq!(subscription.payment_method, Some(PaymentMethod::Mpesa));
    assert_eq!(
        subscription.current_period_end,
        Some((paid_at + Duration::days(30)).naive_utc())
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_replayed_callback_is_a_no_op() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = TransactionRepository::new(db.clone());
    let checkout_id = format!("ws_CO_{}", Uuid::new_v4().simple());
    let pending = repo
        .create_pending(mpesa_checkout(user.id, &checkout_id))
        .await
        .unwrap();

    let declined = ProviderResult::Failed {
        reason: Some("Request cancelled by user".to_string()),
    };
    let first = repo.settle(pending.id, &declined, None, Utc::now()).await.unwrap();
    assert_eq!(first.transaction.status, TransactionStatus::Failed);
    assert_eq!(
        first.transaction.error_message.as_deref(),
        Some("Request cancelled by user")
    );

    let paid = ProviderResult::Paid {
        receipt: Some("LATE".to_string()),
        paid_at: None,
    };
    let second = repo.settle(pending.id, &paid, None, Utc::now()).await.unwrap();
    assert_eq!(
        second.plan,
        SettlementPlan::Skip {
            reason: SkipReason::AlreadySettled(Domain::Failed)
        }
    );
    assert_eq!(second.transaction.status, TransactionStatus::Failed);
    assert!(second.subscription.is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_settlement_settles_once() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = TransactionRepository::new(db.clone());
    let checkout_id = format!("ws_CO_{}", Uuid::new_v4().simple());
    let pending = repo
        .create_pending(mpesa_checkout(user.id, &checkout_id))
        .await
        .unwrap();

    let paid = ProviderResult::Paid {
        receipt: Some("DUP".to_string()),
        paid_at: None,
    };
    let (a, b) = tokio::join!(
        repo.settle(pending.id, &paid, None, Utc::now()),
        repo.settle(pending.id, &paid, None, Utc::now()),
    );

    let writes = [a.unwrap(), b.unwrap()]
        .iter()
        .filter(|s| s.plan.is_write())
        .count();
    assert_eq!(writes, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pesapal_pending_status_keeps_transaction_pending() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = TransactionRepository::new(db.clone());
    let tracking_id = Uuid::new_v4().to_string();
    let reference = format!("SUB-CREATOR-{}", Utc::now().timestamp_millis());

    let pending = repo
        .create_pending(NewTransaction {
            pesapal_order_tracking_id: Some(tracking_id.clone()),
            pesapal_merchant_reference: Some(reference.clone()),
            customer_email: Some(user.email.clone()),
            ..NewTransaction::new(
                user.id,
                PaymentMethod::Pesapal,
                7_900,
                "USD",
                SubscriptionTier::Creator,
            )
        })
        .await
        .unwrap();

    assert_eq!(
        repo.find_by_merchant_reference(&reference).await.unwrap().map(|t| t.id),
        Some(pending.id)
    );

    let settlement = repo
        .settle(pending.id, &ProviderResult::Pending, None, Utc::now())
        .await
        .unwrap();
    assert_eq!(
        settlement.plan,
        SettlementPlan::Skip {
            reason: SkipReason::StillPending
        }
    );

    let settlement = repo
        .settle(
            pending.id,
            &ProviderResult::Paid {
                receipt: Some("PSP-CONF-1".to_string()),
                paid_at: None,
            },
            None,
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(
        settlement.transaction.pesapal_confirmation_code.as_deref(),
        Some("PSP-CONF-1")
    );
    assert_eq!(settlement.transaction.mpesa_receipt_number, None);

    let refunded = repo.mark_refunded(pending.id).await.unwrap();
    assert_eq!(refunded.status, TransactionStatus::Refunded);
    assert!(refunded.refunded_at.is_some());

    assert!(matches!(
        repo.mark_refunded(pending.id).await,
        Err(TransactionError::Settlement(_))
    ));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_settle_unknown_transaction() {
    let db = common::connect().await;
    let repo = TransactionRepository::new(db.clone());
    let id = Uuid::new_v4();

    let result = repo.settle(id, &ProviderResult::Pending, None, Utc::now()).await;
    assert!(matches!(result, Err(TransactionError::NotFound(missing)) if missing == id));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_activation_updates_existing_subscription() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let subscriptions = SubscriptionRepository::new(db.clone());

    let free = subscriptions.ensure_free(user.id).await.unwrap();
    assert_eq!(free.tier, SubscriptionTier::Free);
    assert_eq!(subscriptions.ensure_free(user.id).await.unwrap().id, free.id);

    let repo = TransactionRepository::new(db.clone());
    let checkout_id = format!("ws_CO_{}", Uuid::new_v4().simple());
    let pending = repo
        .create_pending(mpesa_checkout(user.id, &checkout_id))
        .await
        .unwrap();
    let settlement = repo
        .settle(
            pending.id,
            &ProviderResult::Paid {
                receipt: None,
                paid_at: None,
            },
            None,
            Utc::now(),
        )
        .await
        .unwrap();

    let upgraded = settlement.subscription.unwrap();
    assert_eq!(upgraded.id, free.id);
    assert_eq!(upgraded.tier, SubscriptionTier::Pro);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_list_transactions_paginates() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = TransactionRepository::new(db.clone());

    for _ in 0..3 {
        let checkout_id = format!("ws_CO_{}", Uuid::new_v4().simple());
        repo.create_pending(mpesa_checkout(user.id, &checkout_id))
            .await
            .unwrap();
    }

    let page = PageRequest {
        page: 2,
        per_page: 2,
    };
    let (rows, total) = repo.list_by_user(user.id, &page).await.unwrap();
    assert_eq!(total, 3);
    assert_eq!(rows.len(), 1);
}
