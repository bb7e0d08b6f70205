//! Database seeder for ContentForge development and testing.
//!
//! Seeds a verified demo user on the free tier with one brand and one
//! project, so the API can be exercised without going through email
//! verification.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use serde_json::json;

use contentforge_core::auth::hash_password;
use contentforge_db::entities::sea_orm_active_enums::ContentType;
use contentforge_db::repositories::{NewBrand, NewProject};
use contentforge_db::{BrandRepository, ProjectRepository, SubscriptionRepository, UserRepository};
use contentforge_shared::AppConfig;

const DEMO_EMAIL: &str = "demo@contentforge.dev";
const DEMO_PASSWORD: &str = "contentforge-demo";
const DEMO_NAME: &str = "Demo Creator";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = Arc::new(
        contentforge_db::connect(&config.database)
            .await
            .context("Failed to connect to database")?,
    );

    let users = UserRepository::new(db.clone());
    if users.email_exists(DEMO_EMAIL).await? {
        println!("  Demo user already exists, skipping...");
        return Ok(());
    }

    println!("Seeding demo user...");
    let password_hash = hash_password(DEMO_PASSWORD)?;
    let user = users
        .create_with_credential(DEMO_NAME, DEMO_EMAIL, &password_hash)
        .await?;
    let user = users.mark_email_verified(user.id).await?;
    SubscriptionRepository::new(db.clone())
        .ensure_free(user.id)
        .await?;

    println!("Seeding demo brand...");
    let brand = BrandRepository::new(db.clone())
        .create(
            user.id,
            NewBrand {
                name: "Demo Studio".to_string(),
                description: Some("A podcast about building products in Nairobi".to_string()),
                voice_profile: Some(json!({ "description": "Warm, direct and practical" })),
                visual_identity: None,
                industry: Some("Media".to_string()),
                target_audience: Some("Early-stage founders".to_string()),
            },
        )
        .await?;

    println!("Seeding demo project...");
    ProjectRepository::new(db)
        .create(
            user.id,
            NewProject {
                title: "Episode 1: Finding product-market fit".to_string(),
                description: None,
                content_type: ContentType::Podcast,
                source_url: Some(
                    "https://static.deepgram.com/examples/interview_speech-analytics.wav"
                        .to_string(),
                ),
                file_url: None,
                file_size: None,
                brand_id: Some(brand.id),
            },
        )
        .await?;

    println!("Seeding complete!");
    println!("  Sign in as {DEMO_EMAIL} / {DEMO_PASSWORD}");
    Ok(())
}
