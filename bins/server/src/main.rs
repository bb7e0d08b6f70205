//! ContentForge API Server
//!
//! Main entry point for the ContentForge backend service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contentforge_api::{ApiSettings, AppState, Gateways, create_router};
use contentforge_db::connect;
use contentforge_integrations::{
    ClaudeClient, ContentGenerator, DeepgramClient, ImageKitClient, MediaStorage, MpesaClient,
    MpesaGateway, PesapalClient, PesapalGateway, Transcriber,
};
use contentforge_shared::{AppConfig, EmailService, JwtConfig, JwtService};

/// Builds the clients whose credentials are present.
fn build_gateways(config: &AppConfig) -> anyhow::Result<Gateways> {
    let mut gateways = Gateways::default();

    if config.mpesa.is_configured() {
        let client: Arc<dyn MpesaGateway> = Arc::new(MpesaClient::new(&config.mpesa)?);
        gateways.mpesa = Some(client);
    } else {
        warn!("M-Pesa credentials missing, STK push disabled");
    }

    if config.pesapal.is_configured() {
        let client: Arc<dyn PesapalGateway> = Arc::new(PesapalClient::new(&config.pesapal)?);
        gateways.pesapal = Some(client);
        if config.pesapal.ipn_id.is_empty() {
            warn!("Pesapal IPN id is empty, register one before taking orders");
        }
    } else {
        warn!("Pesapal credentials missing, card checkout disabled");
    }

    if config.anthropic.api_key.is_empty() {
        warn!("Anthropic API key missing, content generation disabled");
    } else {
        let client: Arc<dyn ContentGenerator> = Arc::new(ClaudeClient::new(&config.anthropic)?);
        gateways.content = Some(client);
    }

    if config.deepgram.api_key.is_empty() {
        warn!("Deepgram API key missing, transcription disabled");
    } else {
        let client: Arc<dyn Transcriber> = Arc::new(DeepgramClient::new(&config.deepgram)?);
        gateways.transcriber = Some(client);
    }

    if config.imagekit.is_configured() {
        let client: Arc<dyn MediaStorage> = Arc::new(ImageKitClient::new(&config.imagekit)?);
        gateways.storage = Some(client);
    } else {
        warn!("ImageKit credentials missing, uploads disabled");
    }

    Ok(gateways)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contentforge=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(&config.database).await?;

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        session_expires_secs: i64::try_from(config.jwt.session_expiry_secs)
            .context("jwt.session_expiry_secs is too large")?,
    });

    let email_service = EmailService::new(config.email.clone(), config.app.clone());
    info!(
        smtp_host = %config.email.smtp_host,
        smtp_port = %config.email.smtp_port,
        "Email service configured"
    );

    let gateways = build_gateways(&config)?;

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        email_service: Arc::new(email_service),
        settings: Arc::new(ApiSettings {
            app: config.app.clone(),
            pesapal_ipn_id: config.pesapal.ipn_id.clone(),
        }),
        gateways,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, app_url = %config.app.url, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
