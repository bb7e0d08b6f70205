//! Deepgram pre-recorded transcription.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use contentforge_core::content::{
    Paragraph, Sentence, TranscriptMetadata, TranscriptionResult, Word,
};
use contentforge_shared::config::DeepgramConfig;
use serde::Deserialize;

use crate::error::{IntegrationError, IntegrationResult};
use crate::http;

const PROVIDER: &str = "Deepgram";

/// Model requested for every transcription.
pub const MODEL: &str = "nova-2";

/// Long recordings take a while to transcribe.
const TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(600);

const LISTEN_OPTIONS: [(&str, &str); 7] = [
    ("model", MODEL),
    ("language", "en"),
    ("punctuate", "true"),
    ("diarize", "true"),
    ("paragraphs", "true"),
    ("utterances", "true"),
    ("smart_format", "true"),
];

/// Transcription the content pipeline depends on.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribes a publicly reachable media URL.
    async fn transcribe_url(&self, url: &str) -> IntegrationResult<TranscriptionResult>;

    /// Transcribes uploaded media bytes.
    async fn transcribe_bytes(
        &self,
        media: Bytes,
        content_type: &str,
    ) -> IntegrationResult<TranscriptionResult>;

    /// Returns true when the API key is accepted.
    async fn health_check(&self) -> bool;
}

#[derive(Debug, Deserialize)]
struct ListenResponse {
    #[serde(default)]
    metadata: Option<ListenMetadata>,
    results: Option<ListenResults>,
}

#[derive(Debug, Deserialize)]
struct ListenMetadata {
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    channels: Option<u32>,
    #[serde(default)]
    models: Vec<String>,
    #[serde(default)]
    model_info: HashMap<String, ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    #[serde(default)]
    channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    transcript: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    words: Vec<Word>,
    #[serde(default)]
    paragraphs: Option<ParagraphsBlock>,
}

#[derive(Debug, Deserialize)]
struct ParagraphsBlock {
    #[serde(default)]
    paragraphs: Vec<RawParagraph>,
}

#[derive(Debug, Deserialize)]
struct RawParagraph {
    #[serde(default)]
    sentences: Vec<Sentence>,
    #[serde(default)]
    speaker: Option<u32>,
    start: f64,
    end: f64,
}

impl ListenResponse {
    fn into_result(self) -> IntegrationResult<TranscriptionResult> {
        let alternative = self
            .results
            .and_then(|r| r.channels.into_iter().next())
            .and_then(|c| c.alternatives.into_iter().next())
            .ok_or_else(|| IntegrationError::decode(PROVIDER, "No transcription result found"))?;

        let metadata = self.metadata.map_or_else(
            || TranscriptMetadata {
                duration: 0.0,
                channels: 1,
                model: MODEL.to_string(),
            },
            |m| {
                let model = m
                    .models
                    .first()
                    .and_then(|id| m.model_info.get(id))
                    .and_then(|info| info.name.clone())
                    .unwrap_or_else(|| MODEL.to_string());
                TranscriptMetadata {
                    duration: m.duration.unwrap_or(0.0),
                    channels: m.channels.unwrap_or(1),
                    model,
                }
            },
        );

        let paragraphs = alternative
            .paragraphs
            .map(|block| {
                block
                    .paragraphs
                    .into_iter()
                    .map(|p| Paragraph {
                        sentences: p.sentences,
                        speaker: p.speaker,
                        start: p.start,
                        end: p.end,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(TranscriptionResult {
            transcript: alternative.transcript,
            confidence: alternative.confidence,
            words: alternative.words,
            paragraphs,
            metadata,
        })
    }
}

/// Deepgram HTTP client.
#[derive(Clone)]
pub struct DeepgramClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl DeepgramClient {
    /// Builds a client from configuration.
    pub fn new(config: &DeepgramConfig) -> IntegrationResult<Self> {
        Ok(Self {
            http: http::client(TRANSCRIBE_TIMEOUT)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn listen(&self) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}/v1/listen", self.base_url))
            .query(&LISTEN_OPTIONS)
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.api_key))
    }

    async fn read(&self, response: reqwest::Response) -> IntegrationResult<TranscriptionResult> {
        let body: ListenResponse =
            http::read_json(PROVIDER, response, "/err_msg", "Transcription failed").await?;
        let result = body.into_result()?;
        tracing::info!(
            duration = result.metadata.duration,
            paragraphs = result.paragraphs.len(),
            "Transcription complete"
        );
        Ok(result)
    }
}

#[async_trait]
impl Transcriber for DeepgramClient {
    async fn transcribe_url(&self, url: &str) -> IntegrationResult<TranscriptionResult> {
        tracing::debug!(url, "Transcribing from URL");
        let response = self
            .listen()
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?;
        self.read(response).await
    }

    async fn transcribe_bytes(
        &self,
        media: Bytes,
        content_type: &str,
    ) -> IntegrationResult<TranscriptionResult> {
        tracing::debug!(bytes = media.len(), content_type, "Transcribing uploaded media");
        let response = self
            .listen()
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(media)
            .send()
            .await?;
        self.read(response).await
    }

    async fn health_check(&self) -> bool {
        let result = self
            .http
            .get(format!("{}/v1/projects", self.base_url))
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.api_key))
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::error!(error = %e, "Deepgram health check failed");
                false
            }
        }
    }
}
