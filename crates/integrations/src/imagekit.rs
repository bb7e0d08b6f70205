//! ImageKit media storage.
//!
//! Browsers upload directly using signed authentication parameters; the
//! server can also upload, inspect, list and delete files.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use contentforge_shared::config::ImageKitConfig;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use uuid::Uuid;

use crate::error::{IntegrationError, IntegrationResult};
use crate::http::{self, DEFAULT_TIMEOUT};

const PROVIDER: &str = "ImageKit";

/// Folder used when the caller names none.
pub const DEFAULT_FOLDER: &str = "uploads";

/// How long upload authentication parameters stay valid.
pub const AUTH_PARAMS_TTL_MINUTES: i64 = 30;

/// Signed parameters for a client-side upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationParameters {
    /// Single-use token.
    pub token: String,
    /// Unix seconds after which the signature is rejected.
    pub expire: i64,
    /// Hex HMAC-SHA1 of `token + expire` keyed by the private key.
    pub signature: String,
    /// Public key the browser sends alongside.
    pub public_key: String,
}

/// A stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageKitFile {
    /// ImageKit file id.
    pub file_id: String,
    /// Stored name (unique when requested).
    pub name: String,
    /// Delivery URL.
    pub url: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: Option<i64>,
    /// Full path inside the media library.
    #[serde(default)]
    pub file_path: Option<String>,
    /// `image` or `non-image`.
    #[serde(default)]
    pub file_type: Option<String>,
    /// Thumbnail URL, for images and videos.
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// Filters for listing files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesOptions {
    /// Files to skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// ImageKit search query, e.g. `size > 1mb`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    /// Folder path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// A file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// File contents.
    pub file: Bytes,
    /// Requested file name.
    pub file_name: String,
    /// Target folder, `uploads` when `None`.
    pub folder: Option<String>,
}

/// Media storage operations the API layer depends on.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Signed parameters for a browser upload, valid for thirty minutes.
    fn authentication_parameters(&self) -> IntegrationResult<AuthenticationParameters>;

    /// Uploads a file with a unique name.
    async fn upload(&self, request: UploadRequest) -> IntegrationResult<ImageKitFile>;

    /// Deletes a file.
    async fn delete_file(&self, file_id: &str) -> IntegrationResult<()>;

    /// Fetches file details.
    async fn file_details(&self, file_id: &str) -> IntegrationResult<ImageKitFile>;

    /// Lists files.
    async fn list_files(&self, options: ListFilesOptions) -> IntegrationResult<Vec<ImageKitFile>>;
}

/// Computes upload authentication parameters.
///
/// # Errors
///
/// Returns `InvalidInput` if the MAC rejects the key.
pub fn sign_upload(
    private_key: &str,
    public_key: &str,
    token: String,
    expire: i64,
) -> IntegrationResult<AuthenticationParameters> {
    let mut mac = Hmac::<Sha1>::new_from_slice(private_key.as_bytes())
        .map_err(|e| IntegrationError::InvalidInput(e.to_string()))?;
    mac.update(format!("{token}{expire}").as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(AuthenticationParameters {
        token,
        expire,
        signature,
        public_key: public_key.to_string(),
    })
}

/// ImageKit HTTP client.
#[derive(Clone)]
pub struct ImageKitClient {
    http: reqwest::Client,
    public_key: String,
    private_key: String,
    upload_base_url: String,
    api_base_url: String,
}

impl ImageKitClient {
    /// Builds a client from configuration.
    pub fn new(config: &ImageKitConfig) -> IntegrationResult<Self> {
        Ok(Self {
            http: http::client(DEFAULT_TIMEOUT.saturating_mul(10))?,
            public_key: config.public_key.clone(),
            private_key: config.private_key.clone(),
            upload_base_url: config.upload_base_url.trim_end_matches('/').to_string(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Parameters for an upload expiring thirty minutes after `now`.
    pub fn authentication_parameters_at(
        &self,
        now: DateTime<Utc>,
    ) -> IntegrationResult<AuthenticationParameters> {
        let expire = (now + Duration::minutes(AUTH_PARAMS_TTL_MINUTES)).timestamp();
        sign_upload(
            &self.private_key,
            &self.public_key,
            Uuid::new_v4().to_string(),
            expire,
        )
    }

    fn basic_auth(&self) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:", self.private_key)))
    }
}

#[async_trait]
impl MediaStorage for ImageKitClient {
    fn authentication_parameters(&self) -> IntegrationResult<AuthenticationParameters> {
        self.authentication_parameters_at(Utc::now())
    }

    async fn upload(&self, request: UploadRequest) -> IntegrationResult<ImageKitFile> {
        let folder = request.folder.unwrap_or_else(|| DEFAULT_FOLDER.to_string());
        tracing::debug!(file_name = %request.file_name, folder = %folder, bytes = request.file.len(), "Uploading to ImageKit");

        let part = reqwest::multipart::Part::stream(request.file).file_name(request.file_name.clone());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("fileName", request.file_name)
            .text("folder", folder)
            .text("useUniqueFileName", "true");

        let response = self
            .http
            .post(format!("{}/api/v1/files/upload", self.upload_base_url))
            .header(reqwest::header::AUTHORIZATION, self.basic_auth())
            .multipart(form)
            .send()
            .await?;

        http::read_json(PROVIDER, response, "/message", "ImageKit upload failed").await
    }

    async fn delete_file(&self, file_id: &str) -> IntegrationResult<()> {
        let response = self
            .http
            .delete(format!("{}/v1/files/{file_id}", self.api_base_url))
            .header(reqwest::header::AUTHORIZATION, self.basic_auth())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(file_id, "Deleted ImageKit file");
            return Ok(());
        }

        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body
            .pointer("/message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("ImageKit delete failed");
        Err(IntegrationError::api(PROVIDER, Some(status.as_u16()), message))
    }

    async fn file_details(&self, file_id: &str) -> IntegrationResult<ImageKitFile> {
        let response = self
            .http
            .get(format!("{}/v1/files/{file_id}/details", self.api_base_url))
            .header(reqwest::header::AUTHORIZATION, self.basic_auth())
            .send()
            .await?;

        http::read_json(PROVIDER, response, "/message", "ImageKit getFileDetails failed").await
    }

    async fn list_files(&self, options: ListFilesOptions) -> IntegrationResult<Vec<ImageKitFile>> {
        let response = self
            .http
            .get(format!("{}/v1/files", self.api_base_url))
            .query(&options)
            .header(reqwest::header::AUTHORIZATION, self.basic_auth())
            .send()
            .await?;

        http::read_json(PROVIDER, response, "/message", "ImageKit listFiles failed").await
    }
}
