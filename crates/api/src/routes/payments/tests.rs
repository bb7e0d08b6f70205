use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header::AUTHORIZATION, header::LOCATION},
};
use chrono::{Duration, Utc};
use rstest::rstest;
use rust_decimal::Decimal;
use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use crate::Gateways;
use crate::test_support::{
    active_session, app, bearer, bearer_as, body_json, empty_db, queries, signed_in_db,
    state_on, state_with,
};
use contentforge_core::payments::{PesapalTransactionStatus, StkPushResponse, StkQueryResponse};
use contentforge_db::entities::sea_orm_active_enums::{
    PaymentMethod, SubscriptionStatus, SubscriptionTier, TransactionStatus, UserRole,
};
use contentforge_db::entities::{subscription, transaction, user};
use contentforge_integrations::{
    IpnNotificationType, MockMpesaGateway, MockPesapalGateway, MpesaGateway, PesapalGateway,
    PesapalPaymentResponse, RefundResponse,
};

fn pending_query(checkout_request_id: &str) -> StkQueryResponse {
    StkQueryResponse {
        response_code: "0".to_string(),
        response_description: "The service request has been accepted successsfully".to_string(),
        merchant_request_id: "29115-34620561-1".to_string(),
        checkout_request_id: checkout_request_id.to_string(),
        result_code: "4999".to_string(),
        result_desc: "The transaction is still under processing".to_string(),
    }
}

#[tokio::test]
async fn test_malformed_mpesa_callback_is_acknowledged() {
    let response = app(state_with(empty_db(), Gateways::default()))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/payments/mpesa/callback")
                .header("Content-Type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ResultCode"], 0);
    assert_eq!(body["ResultDesc"], "Accepted");
}

#[tokio::test]
async fn test_callback_for_unknown_checkout_is_acknowledged() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<transaction::Model>::new()])
        .into_connection();

    let callback = json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": "ws_CO_191220191020363925",
                "ResultCode": 1032,
                "ResultDesc": "Request cancelled by user"
            }
        }
    });

    let response = app(state_with(db, Gateways::default()))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/payments/mpesa/callback")
                .header("Content-Type", "application/json")
                .body(Body::from(callback.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ResultCode"], 0);
}

#[tokio::test]
async fn test_stk_push_requires_session() {
    let response = app(state_with(empty_db(), Gateways::default()))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/payments/mpesa/stk-push")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"phoneNumber":"0712345678","plan":"pro"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_stk_push_without_gateway_returns_503() {
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    let state = state_with(signed_in_db(user_id, session_id), Gateways::default());
    let token = bearer(&state, user_id, session_id);

    let response = app(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/payments/mpesa/stk-push")
                .header(AUTHORIZATION, token)
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"phoneNumber":"0712345678","plan":"pro"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_stk_push_rejects_foreign_phone() {
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    let gateway: Arc<dyn MpesaGateway> = Arc::new(MockMpesaGateway::new());
    let state = state_with(
        signed_in_db(user_id, session_id),
        Gateways {
            mpesa: Some(gateway),
            ..Gateways::default()
        },
    );
    let token = bearer(&state, user_id, session_id);

    let response = app(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/payments/mpesa/stk-push")
                .header(AUTHORIZATION, token)
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"phoneNumber":"+14155550100","plan":"pro"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_status_requires_checkout_request_id() {
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    let state = state_with(signed_in_db(user_id, session_id), Gateways::default());
    let token = bearer(&state, user_id, session_id);

    let response = app(state)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/payments/mpesa/status")
                .header(AUTHORIZATION, token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Missing checkoutRequestID"
    );
}

#[tokio::test]
async fn test_pending_status_is_reported_without_settling() {
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    let mut mock = MockMpesaGateway::new();
    mock.expect_stk_query()
        .withf(|id| id == "ws_CO_1")
        .times(1)
        .returning(|id| Ok(pending_query(id)));

    let gateway: Arc<dyn MpesaGateway> = Arc::new(mock);
    let state = state_with(
        signed_in_db(user_id, session_id),
        Gateways {
            mpesa: Some(gateway),
            ..Gateways::default()
        },
    );
    let token = bearer(&state, user_id, session_id);

    let response = app(state)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/payments/mpesa/status?checkoutRequestID=ws_CO_1")
                .header(AUTHORIZATION, token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["ResultCode"], "4999");
    assert_eq!(body["CheckoutRequestID"], "ws_CO_1");
}

#[tokio::test]
async fn test_pesapal_return_without_tracking_id_redirects_with_error() {
    let response = app(state_with(empty_db(), Gateways::default()))
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/payments/pesapal/callback")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[LOCATION],
        "http://localhost:3000/dashboard/billing?status=error"
    );
}

#[tokio::test]
async fn test_pesapal_ipn_requires_tracking_id() {
    let response = app(state_with(empty_db(), Gateways::default()))
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/payments/pesapal/callback")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"OrderNotificationType":"IPNCHANGE"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_plans_are_public() {
    let response = app(state_with(empty_db(), Gateways::default()))
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/billing/plans")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["plans"].as_array().is_some_and(|plans| !plans.is_empty()));
}

const CHECKOUT_ID: &str = "ws_CO_191220191020363925";
const ORDER_ID: &str = "b945e4af-80a5-4ec1-8706-e03f8332fb04";

fn customer(id: Uuid, role: UserRole) -> user::Model {
    let now = Utc::now().naive_utc();
    user::Model {
        id,
        name: "Wanjiku Kamau".to_string(),
        email: "wanjiku@example.co.ke".to_string(),
        email_verified: true,
        image: None,
        role,
        created_at: now,
        updated_at: now,
    }
}

fn mpesa_row(user_id: Uuid, amount: i32) -> transaction::Model {
    let now = Utc::now().naive_utc();
    transaction::Model {
        id: Uuid::new_v4(),
        user_id,
        subscription_id: None,
        payment_method: PaymentMethod::Mpesa,
        status: TransactionStatus::Pending,
        amount,
        currency: "KES".to_string(),
        tier: SubscriptionTier::Pro,
        stripe_payment_intent_id: None,
        pesapal_order_tracking_id: None,
        pesapal_merchant_reference: None,
        pesapal_confirmation_code: None,
        mpesa_checkout_request_id: Some(CHECKOUT_ID.to_string()),
        mpesa_merchant_request_id: Some("29115-34620561-1".to_string()),
        mpesa_receipt_number: None,
        customer_email: Some("wanjiku@example.co.ke".to_string()),
        customer_phone: Some("254712345678".to_string()),
        customer_name: Some("Wanjiku Kamau".to_string()),
        metadata: None,
        error_message: None,
        paid_at: None,
        refunded_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn pesapal_row(user_id: Uuid) -> transaction::Model {
    transaction::Model {
        payment_method: PaymentMethod::Pesapal,
        amount: 19_900,
        currency: "USD".to_string(),
        pesapal_order_tracking_id: Some(ORDER_ID.to_string()),
        pesapal_merchant_reference: Some("CF-PRO-1708000000000".to_string()),
        mpesa_checkout_request_id: None,
        mpesa_merchant_request_id: None,
        ..mpesa_row(user_id, 19_900)
    }
}

fn settled(
    row: &transaction::Model,
    status: TransactionStatus,
    error: Option<&str>,
) -> transaction::Model {
    transaction::Model {
        status,
        error_message: error.map(str::to_string),
        ..row.clone()
    }
}

fn pro_subscription(user_id: Uuid) -> subscription::Model {
    let now = Utc::now().naive_utc();
    subscription::Model {
        id: Uuid::new_v4(),
        user_id,
        stripe_customer_id: None,
        stripe_subscription_id: None,
        payment_method: Some(PaymentMethod::Mpesa),
        tier: SubscriptionTier::Pro,
        status: SubscriptionStatus::Active,
        current_period_start: Some(now),
        current_period_end: Some(now + Duration::days(30)),
        cancel_at_period_end: Some(false),
        created_at: now,
        updated_at: now,
    }
}

fn pesapal_status(status_code: i32, description: &str) -> PesapalTransactionStatus {
    serde_json::from_value(json!({
        "payment_method": "MpesaKE",
        "amount": 199,
        "confirmation_code": "AA11BB22",
        "payment_status_description": description,
        "status_code": status_code,
        "merchant_reference": "CF-PRO-1708000000000",
        "currency": "USD"
    }))
    .expect("status fixture")
}

fn with_mpesa(mock: MockMpesaGateway) -> Gateways {
    let gateway: Arc<dyn MpesaGateway> = Arc::new(mock);
    Gateways {
        mpesa: Some(gateway),
        ..Gateways::default()
    }
}

fn with_pesapal(mock: MockPesapalGateway) -> Gateways {
    let gateway: Arc<dyn PesapalGateway> = Arc::new(mock);
    Gateways {
        pesapal: Some(gateway),
        ..Gateways::default()
    }
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn stk_callback(result_code: i64, description: &str, amount: Option<i64>) -> Value {
    let mut callback = json!({
        "MerchantRequestID": "29115-34620561-1",
        "CheckoutRequestID": CHECKOUT_ID,
        "ResultCode": result_code,
        "ResultDesc": description
    });
    if let Some(amount) = amount {
        callback["CallbackMetadata"] = json!({
            "Item": [
                { "Name": "Amount", "Value": amount },
                { "Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV" },
                { "Name": "TransactionDate", "Value": 20_240_215_103_000_i64 },
                { "Name": "PhoneNumber", "Value": 254_712_345_678_i64 }
            ]
        });
    }
    json!({ "Body": { "stkCallback": callback } })
}

#[tokio::test]
async fn test_stk_push_stores_pending_transaction() {
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    let stored = mpesa_row(user_id, 25_000);
    let stored_id = stored.id;

    let mut mock = MockMpesaGateway::new();
    mock.expect_stk_push()
        .withf(|request| {
            request.phone == "254712345678"
                && request.amount == 25_000
                && request.callback_url == "http://localhost:3000/api/v1/payments/mpesa/callback"
        })
        .times(1)
        .returning(|_| {
            Ok(StkPushResponse {
                merchant_request_id: "29115-34620561-1".to_string(),
                checkout_request_id: CHECKOUT_ID.to_string(),
                response_code: "0".to_string(),
                response_description: "Success. Request accepted for processing".to_string(),
                customer_message: "Success. Request accepted for processing".to_string(),
            })
        });

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![active_session(user_id, session_id)]])
            .append_query_results([vec![customer(user_id, UserRole::User)]])
            .append_query_results([vec![stored]])
            .into_connection(),
    );
    let state = state_on(&db, with_mpesa(mock));
    let token = bearer(&state, user_id, session_id);

    let response = app(state)
        .oneshot(post_json(
            "/api/v1/payments/mpesa/stk-push",
            Some(&token),
            json!({ "phoneNumber": "0712345678", "plan": "pro" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["CheckoutRequestID"], CHECKOUT_ID);
    assert_eq!(body["transactionId"], stored_id.to_string());
    assert_eq!(body["poll"]["intervalSeconds"], 6);
    assert_eq!(body["poll"]["maxAttempts"], 20);

    let sql = queries(db);
    assert!(sql.last().is_some_and(|s| s.starts_with(r#"INSERT INTO "transaction""#)));
}

#[tokio::test]
async fn test_underpaid_stk_push_is_rejected_before_the_gateway() {
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    let state = state_with(
        signed_in_db(user_id, session_id),
        with_mpesa(MockMpesaGateway::new()),
    );
    let token = bearer(&state, user_id, session_id);

    let response = app(state)
        .oneshot(post_json(
            "/api/v1/payments/mpesa/stk-push",
            Some(&token),
            json!({ "phoneNumber": "0712345678", "plan": "agency", "amount": 1 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(
        body["message"]
            .as_str()
            .is_some_and(|m| m.contains("KSH 63,000"))
    );
}

#[tokio::test]
async fn test_paid_callback_activates_subscription() {
    let user_id = Uuid::new_v4();
    let row = mpesa_row(user_id, 25_000);
    let completed = settled(&row, TransactionStatus::Completed, None);

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row.clone()]])
            .append_query_results([vec![row.clone()]])
            .append_query_results([vec![customer(user_id, UserRole::User)]])
            .append_query_results([Vec::<subscription::Model>::new()])
            .append_query_results([vec![pro_subscription(user_id)]])
            .append_query_results([vec![completed]])
            .into_connection(),
    );

    let response = app(state_on(&db, Gateways::default()))
        .oneshot(post_json(
            "/api/v1/payments/mpesa/callback",
            None,
            stk_callback(0, "The service request is processed successfully.", Some(25_000)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ResultCode"], 0);

    let sql = queries(db);
    assert!(sql.iter().any(|s| s.starts_with(r#"INSERT INTO "subscription""#)));
    assert!(sql.iter().any(|s| s.starts_with(r#"UPDATE "transaction""#)));
    assert_eq!(sql.last().map(String::as_str), Some("COMMIT"));
}

#[tokio::test]
async fn test_declined_callback_fails_transaction() {
    let user_id = Uuid::new_v4();
    let row = mpesa_row(user_id, 25_000);
    let failed = settled(
        &row,
        TransactionStatus::Failed,
        Some("Request cancelled by user"),
    );

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row.clone()]])
            .append_query_results([vec![row.clone()]])
            .append_query_results([vec![failed]])
            .into_connection(),
    );

    let response = app(state_on(&db, Gateways::default()))
        .oneshot(post_json(
            "/api/v1/payments/mpesa/callback",
            None,
            stk_callback(1032, "Request cancelled by user", None),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ResultDesc"], "Accepted");

    let sql = queries(db);
    assert!(sql.iter().any(|s| s.starts_with(r#"UPDATE "transaction""#)));
    assert!(sql.iter().all(|s| !s.contains(r#"INSERT INTO "subscription""#)));
}

#[tokio::test]
async fn test_final_status_settles_callers_transaction() {
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    let row = mpesa_row(user_id, 25_000);
    let failed = settled(
        &row,
        TransactionStatus::Failed,
        Some("Request cancelled by user"),
    );

    let mut mock = MockMpesaGateway::new();
    mock.expect_stk_query().times(1).returning(|id| {
        Ok(StkQueryResponse {
            result_code: "1032".to_string(),
            result_desc: "Request cancelled by user".to_string(),
            ..pending_query(id)
        })
    });

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![active_session(user_id, session_id)]])
            .append_query_results([vec![row.clone()]])
            .append_query_results([vec![row.clone()]])
            .append_query_results([vec![failed]])
            .into_connection(),
    );
    let state = state_on(&db, with_mpesa(mock));
    let token = bearer(&state, user_id, session_id);

    let response = app(state)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!(
                    "/api/v1/payments/mpesa/status?checkoutRequestID={CHECKOUT_ID}"
                ))
                .header(AUTHORIZATION, token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "failed");

    let sql = queries(db);
    assert!(sql.iter().any(|s| s.ends_with("FOR UPDATE")));
    assert!(sql.iter().any(|s| s.starts_with(r#"UPDATE "transaction""#)));
}

#[tokio::test]
async fn test_pesapal_initiate_creates_order_and_pending_row() {
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());

    let mut mock = MockPesapalGateway::new();
    mock.expect_submit_order()
        .withf(|order| {
            order.amount == Decimal::from(199)
                && order.currency == "USD"
                && order.billing_address.email_address == "wanjiku@example.co.ke"
        })
        .times(1)
        .returning(|order| {
            Ok(PesapalPaymentResponse {
                order_tracking_id: ORDER_ID.to_string(),
                merchant_reference: order.id,
                redirect_url: "https://pay.pesapal.com/iframe/PesapalIframe3/Index?OrderTrackingId=b945e4af".to_string(),
                status: Some("200".to_string()),
            })
        });

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![active_session(user_id, session_id)]])
            .append_query_results([vec![pesapal_row(user_id)]])
            .into_connection(),
    );
    let state = state_on(&db, with_pesapal(mock));
    let token = bearer(&state, user_id, session_id);

    let response = app(state)
        .oneshot(post_json(
            "/api/v1/payments/pesapal/initiate",
            Some(&token),
            json!({
                "email": "wanjiku@example.co.ke",
                "firstName": "Wanjiku",
                "lastName": "Kamau",
                "plan": "pro"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["order_tracking_id"], ORDER_ID);
    assert!(
        body["merchant_reference"]
            .as_str()
            .is_some_and(|r| !r.is_empty())
    );

    let sql = queries(db);
    assert!(sql.last().is_some_and(|s| s.starts_with(r#"INSERT INTO "transaction""#)));
}

#[tokio::test]
async fn test_underpaid_pesapal_initiate_is_rejected() {
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    let state = state_with(
        signed_in_db(user_id, session_id),
        with_pesapal(MockPesapalGateway::new()),
    );
    let token = bearer(&state, user_id, session_id);

    let response = app(state)
        .oneshot(post_json(
            "/api/v1/payments/pesapal/initiate",
            Some(&token),
            json!({
                "amount": 10,
                "email": "wanjiku@example.co.ke",
                "firstName": "Wanjiku",
                "lastName": "Kamau",
                "plan": "pro"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "VALIDATION_ERROR");
}

#[rstest]
#[case(1, "Completed", TransactionStatus::Completed, "success")]
#[case(2, "Failed", TransactionStatus::Failed, "failed")]
#[tokio::test]
async fn test_pesapal_return_settles_and_redirects(
    #[case] status_code: i32,
    #[case] description: &'static str,
    #[case] outcome: TransactionStatus,
    #[case] redirect: &'static str,
) {
    let user_id = Uuid::new_v4();
    let row = pesapal_row(user_id);

    let mut mock = MockPesapalGateway::new();
    mock.expect_transaction_status()
        .withf(|id| id == ORDER_ID)
        .times(1)
        .returning(move |_| Ok(pesapal_status(status_code, description)));

    let mut db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![row.clone()]])
        .append_query_results([vec![row.clone()]]);
    if outcome == TransactionStatus::Completed {
        db = db
            .append_query_results([vec![customer(user_id, UserRole::User)]])
            .append_query_results([Vec::<subscription::Model>::new()])
            .append_query_results([vec![pro_subscription(user_id)]]);
    }
    let db = Arc::new(
        db.append_query_results([vec![settled(&row, outcome, None)]])
            .into_connection(),
    );

    let response = app(state_on(&db, with_pesapal(mock)))
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!(
                    "/api/v1/payments/pesapal/callback?OrderTrackingId={ORDER_ID}&OrderMerchantReference=CF-PRO-1708000000000"
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[LOCATION],
        format!("http://localhost:3000/dashboard/billing?status={redirect}").as_str()
    );
    assert!(
        queries(db)
            .iter()
            .any(|s| s.starts_with(r#"UPDATE "transaction""#))
    );
}

#[tokio::test]
async fn test_ipn_is_acknowledged_when_the_database_fails() {
    let mut mock = MockPesapalGateway::new();
    mock.expect_transaction_status()
        .times(1)
        .returning(|_| Ok(pesapal_status(1, "Completed")));

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([DbErr::Custom("connection reset by peer".to_string())])
        .into_connection();

    let response = app(state_with(db, with_pesapal(mock)))
        .oneshot(post_json(
            "/api/v1/payments/pesapal/callback",
            None,
            json!({
                "OrderTrackingId": ORDER_ID,
                "OrderMerchantReference": "CF-PRO-1708000000000",
                "OrderNotificationType": "IPNCHANGE"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "success": true }));
}

#[tokio::test]
async fn test_admin_refunds_completed_pesapal_payment() {
    let (admin_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    let row = transaction::Model {
        status: TransactionStatus::Completed,
        pesapal_confirmation_code: Some("AA11BB22".to_string()),
        ..pesapal_row(Uuid::new_v4())
    };
    let row_id = row.id;

    let mut mock = MockPesapalGateway::new();
    mock.expect_refund()
        .withf(|request| {
            request.confirmation_code == "AA11BB22"
                && request.amount == Decimal::from(199)
                && request.username == "wanjiku@example.co.ke"
        })
        .times(1)
        .returning(|_| {
            Ok(RefundResponse {
                status: Some("200".to_string()),
                message: Some("Refund request successfully".to_string()),
            })
        });

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![active_session(admin_id, session_id)]])
            .append_query_results([vec![row.clone()]])
            .append_query_results([vec![customer(admin_id, UserRole::Admin)]])
            .append_query_results([vec![row.clone()]])
            .append_query_results([vec![settled(&row, TransactionStatus::Refunded, None)]])
            .into_connection(),
    );
    let state = state_on(&db, with_pesapal(mock));
    let token = bearer_as(&state, admin_id, session_id, "admin");

    let response = app(state)
        .oneshot(post_json(
            "/api/v1/payments/pesapal/refund",
            Some(&token),
            json!({ "transactionId": row_id }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["transaction"]["status"], "refunded");

    let sql = queries(db);
    assert!(sql.last().is_some_and(|s| s.starts_with(r#"UPDATE "transaction""#)));
}

#[tokio::test]
async fn test_refund_requires_admin() {
    let (user_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());
    let state = state_with(
        signed_in_db(user_id, session_id),
        with_pesapal(MockPesapalGateway::new()),
    );
    let token = bearer(&state, user_id, session_id);

    let response = app(state)
        .oneshot(post_json(
            "/api/v1/payments/pesapal/refund",
            Some(&token),
            json!({ "transactionId": Uuid::new_v4() }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_registers_default_ipn_url() {
    let (admin_id, session_id) = (Uuid::new_v4(), Uuid::new_v4());

    let mut mock = MockPesapalGateway::new();
    mock.expect_register_ipn()
        .withf(|url, kind| {
            url == "http://localhost:3000/api/v1/payments/pesapal/callback"
                && *kind == IpnNotificationType::Post
        })
        .times(1)
        .returning(|_, _| Ok("e6d4f1b2-ipn".to_string()));

    let state = state_with(signed_in_db(admin_id, session_id), with_pesapal(mock));
    let token = bearer_as(&state, admin_id, session_id, "admin");

    let response = app(state)
        .oneshot(post_json(
            "/api/v1/payments/pesapal/ipn/register",
            Some(&token),
            json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ipn_id"], "e6d4f1b2-ipn");
    assert_eq!(
        body["url"],
        "http://localhost:3000/api/v1/payments/pesapal/callback"
    );
}
