//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Public application settings.
    #[serde(default)]
    pub app: AppSettings,
    /// Email configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// M-Pesa (Daraja) credentials.
    #[serde(default)]
    pub mpesa: MpesaConfig,
    /// Pesapal credentials.
    #[serde(default)]
    pub pesapal: PesapalConfig,
    /// ImageKit credentials.
    #[serde(default)]
    pub imagekit: ImageKitConfig,
    /// Anthropic (Claude) credentials.
    #[serde(default)]
    pub anthropic: AnthropicConfig,
    /// Deepgram credentials.
    #[serde(default)]
    pub deepgram: DeepgramConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration as loaded from config sources.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Session (and access token) lifetime in seconds.
    #[serde(default = "default_session_expiry")]
    pub session_expiry_secs: u64,
}

fn default_session_expiry() -> u64 {
    604_800 // 7 days
}

/// Public application settings used in links and callback URLs.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// Product name shown in emails.
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Public base URL of the application, without trailing slash.
    #[serde(default = "default_app_url")]
    pub url: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            url: default_app_url(),
        }
    }
}

impl AppSettings {
    /// Joins a path onto the public base URL.
    #[must_use]
    pub fn link(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn default_app_name() -> String {
    "ContentForge".to_string()
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

/// Email configuration for the Resend SMTP relay.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP host.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Use implicit TLS. Disable only for a local catcher such as Mailpit.
    #[serde(default = "default_true")]
    pub smtp_tls: bool,
    /// SMTP username (`resend` for the Resend relay).
    #[serde(default = "default_smtp_username")]
    pub smtp_username: String,
    /// SMTP password (the Resend API key).
    #[serde(default)]
    pub smtp_password: String,
    /// Sender address.
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_app_name")]
    pub from_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_tls: true,
            smtp_username: default_smtp_username(),
            smtp_password: String::new(),
            from_email: default_from_email(),
            from_name: default_app_name(),
        }
    }
}

fn default_smtp_host() -> String {
    "smtp.resend.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_smtp_username() -> String {
    "resend".to_string()
}

fn default_from_email() -> String {
    "noreply@contentforge.app".to_string()
}

fn default_true() -> bool {
    true
}

/// Which provider environment to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderEnvironment {
    /// Provider sandbox / QA environment.
    #[default]
    Sandbox,
    /// Live environment.
    Production,
}

/// M-Pesa Daraja API configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MpesaConfig {
    /// Sandbox or production.
    pub environment: ProviderEnvironment,
    /// Overrides the environment base URL.
    pub base_url: Option<String>,
    /// OAuth consumer key.
    pub consumer_key: String,
    /// OAuth consumer secret.
    pub consumer_secret: String,
    /// Lipa Na M-Pesa Online passkey.
    pub passkey: String,
    /// Paybill business short code.
    pub shortcode: String,
}

impl MpesaConfig {
    /// Returns the API base URL for the configured environment.
    #[must_use]
    pub fn base_url(&self) -> String {
        if let Some(url) = &self.base_url {
            return url.trim_end_matches('/').to_string();
        }
        match self.environment {
            ProviderEnvironment::Production => "https://api.safaricom.co.ke".to_string(),
            ProviderEnvironment::Sandbox => "https://sandbox.safaricom.co.ke".to_string(),
        }
    }

    /// Returns true when credentials are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.consumer_key.is_empty()
            && !self.consumer_secret.is_empty()
            && !self.shortcode.is_empty()
    }
}

/// Pesapal v3 API configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PesapalConfig {
    /// Sandbox or production.
    pub environment: ProviderEnvironment,
    /// Overrides the environment base URL.
    pub base_url: Option<String>,
    /// Consumer key.
    pub consumer_key: String,
    /// Consumer secret.
    pub consumer_secret: String,
    /// Registered IPN notification id.
    pub ipn_id: String,
}

impl PesapalConfig {
    /// Returns the API base URL for the configured environment.
    #[must_use]
    pub fn base_url(&self) -> String {
        if let Some(url) = &self.base_url {
            return url.trim_end_matches('/').to_string();
        }
        match self.environment {
            ProviderEnvironment::Production => "https://pay.pesapal.com/v3".to_string(),
            ProviderEnvironment::Sandbox => "https://cybqa.pesapal.com/pesapalv3".to_string(),
        }
    }

    /// Returns true when credentials are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.consumer_key.is_empty() && !self.consumer_secret.is_empty()
    }
}

/// ImageKit configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageKitConfig {
    /// Public key, returned to browsers with upload auth parameters.
    pub public_key: String,
    /// Private key used for signing and Basic auth.
    pub private_key: String,
    /// Delivery URL endpoint.
    pub url_endpoint: String,
    /// Upload API base URL.
    pub upload_base_url: String,
    /// Management API base URL.
    pub api_base_url: String,
}

impl Default for ImageKitConfig {
    fn default() -> Self {
        Self {
            public_key: String::new(),
            private_key: String::new(),
            url_endpoint: String::new(),
            upload_base_url: "https://upload.imagekit.io".to_string(),
            api_base_url: "https://api.imagekit.io".to_string(),
        }
    }
}

impl ImageKitConfig {
    /// Returns true when credentials are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.public_key.is_empty() && !self.private_key.is_empty()
    }
}

/// Anthropic Messages API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    /// API key.
    pub api_key: String,
    /// Model id.
    pub model: String,
    /// Max tokens for content generation.
    pub max_tokens: u32,
    /// API base URL.
    pub base_url: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: 4096,
            base_url: "https://api.anthropic.com".to_string(),
        }
    }
}

/// Deepgram configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeepgramConfig {
    /// API key.
    pub api_key: String,
    /// API base URL.
    pub base_url: String,
}

impl Default for DeepgramConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.deepgram.com".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CONTENTFORGE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
