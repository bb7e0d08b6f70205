//! Integration tests for users, credentials, sessions and verification tokens.
//!
//! Run with `cargo test -p contentforge-db -- --ignored` against a database
//! that already has the ContentForge schema.

mod common;

use chrono::{Duration, Utc};
use contentforge_db::{
    AccountRepository, SessionRepository, UserError, UserRepository, VerificationRepository,
    entities::sea_orm_active_enums::UserRole,
    repositories::{SessionContext, VerificationPurpose},
};
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_user_with_credential() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;

    assert!(!user.email_verified);
    assert_eq!(user.role, UserRole::User);

    let found = UserRepository::new(db.clone())
        .find_by_email(&user.email.to_uppercase())
        .await
        .expect("Failed to find user")
        .expect("User should exist");
    assert_eq!(found.id, user.id);

    let account = AccountRepository::new(db.clone())
        .find_credential(user.id)
        .await
        .expect("Failed to find account")
        .expect("Credential account should exist");
    assert_eq!(account.provider_id, "credential");
    assert_eq!(account.password.as_deref(), Some("$argon2id$test_hash"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_email_is_rejected() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;

    let repo = UserRepository::new(db.clone());
    assert!(repo.email_exists(&user.email).await.unwrap());
    let again = repo
        .create_with_credential("Someone Else", &user.email, "$argon2id$other")
        .await;
    assert!(matches!(again, Err(UserError::EmailTaken)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_verification_token_is_single_use() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = VerificationRepository::new(db.clone());

    let token = repo
        .issue(VerificationPurpose::EmailVerification, user.id, Duration::hours(24))
        .await
        .expect("Failed to issue token");

    // Wrong purpose does not match.
    assert_eq!(
        repo.consume(VerificationPurpose::PasswordReset, &token)
            .await
            .unwrap(),
        None
    );

    assert_eq!(
        repo.consume(VerificationPurpose::EmailVerification, &token)
            .await
            .unwrap(),
        Some(user.id)
    );
    assert_eq!(
        repo.consume(VerificationPurpose::EmailVerification, &token)
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_reissue_replaces_previous_token() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = VerificationRepository::new(db.clone());

    let first = repo
        .issue(VerificationPurpose::PasswordReset, user.id, Duration::hours(1))
        .await
        .unwrap();
    let second = repo
        .issue(VerificationPurpose::PasswordReset, user.id, Duration::hours(1))
        .await
        .unwrap();

    assert_eq!(
        repo.consume(VerificationPurpose::PasswordReset, &first)
            .await
            .unwrap(),
        None
    );
    assert_eq!(
        repo.consume(VerificationPurpose::PasswordReset, &second)
            .await
            .unwrap(),
        Some(user.id)
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_expired_token_is_rejected() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = VerificationRepository::new(db.clone());

    let token = repo
        .issue(VerificationPurpose::EmailVerification, user.id, Duration::seconds(-1))
        .await
        .unwrap();

    assert_eq!(
        repo.consume(VerificationPurpose::EmailVerification, &token)
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_session_lifecycle() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = SessionRepository::new(db.clone());
    let session_id = Uuid::new_v4();

    let session = repo
        .create(
            session_id,
            user.id,
            "opaque-token",
            Utc::now() + Duration::days(7),
            SessionContext {
                user_agent: Some("integration-test".to_string()),
                ip_address: None,
            },
        )
        .await
        .expect("Failed to create session");

    assert_eq!(session.id, session_id.to_string());
    assert_ne!(session.token, "opaque-token");
    assert!(repo.find_active(session_id).await.unwrap().is_some());
    assert_eq!(repo.count_active_sessions(user.id).await.unwrap(), 1);

    assert!(repo.revoke(session_id).await.unwrap());
    assert!(repo.find_active(session_id).await.unwrap().is_none());
    assert!(!repo.revoke(session_id).await.unwrap());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_expired_session_is_not_active() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = SessionRepository::new(db.clone());
    let session_id = Uuid::new_v4();

    repo.create(
        session_id,
        user.id,
        "expired-token",
        Utc::now() - Duration::minutes(1),
        SessionContext::default(),
    )
    .await
    .unwrap();

    assert!(repo.find_active(session_id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_reset_password_revokes_sessions() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let sessions = SessionRepository::new(db.clone());
    let accounts = AccountRepository::new(db.clone());

    for token in ["a", "b"] {
        sessions
            .create(
                Uuid::new_v4(),
                user.id,
                token,
                Utc::now() + Duration::days(7),
                SessionContext::default(),
            )
            .await
            .unwrap();
    }

    assert!(accounts.reset_password(user.id, "$argon2id$new").await.unwrap());
    assert_eq!(sessions.count_active_sessions(user.id).await.unwrap(), 0);

    let account = accounts.find_credential(user.id).await.unwrap().unwrap();
    assert_eq!(account.password.as_deref(), Some("$argon2id$new"));

    assert!(!accounts
        .reset_password(Uuid::new_v4(), "$argon2id$nobody")
        .await
        .unwrap());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_mark_email_verified() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;

    let verified = UserRepository::new(db.clone())
        .mark_email_verified(user.id)
        .await
        .unwrap();
    assert!(verified.email_verified);
}
