//! Claude (Anthropic Messages API) content generation.

use async_trait::async_trait;
use contentforge_core::content::{
    ContentKind, Insights, PromptRequest, Tone, build_prompt, insights_prompt,
    parse_content_response, parse_insights,
};
use contentforge_shared::config::AnthropicConfig;
use serde::{Deserialize, Serialize};

use crate::error::{IntegrationError, IntegrationResult};
use crate::http::{self, DEFAULT_TIMEOUT};

const PROVIDER: &str = "Claude";
const API_VERSION: &str = "2023-06-01";

/// Token budget for insight extraction.
pub const INSIGHTS_MAX_TOKENS: u32 = 2048;

/// An owned generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Source transcript.
    pub transcript: String,
    /// What to produce.
    pub kind: ContentKind,
    /// How many pieces.
    pub count: u32,
    /// Voice.
    pub tone: Tone,
    /// Brand voice description.
    pub brand_voice: Option<String>,
    /// Extra instructions.
    pub additional_context: Option<String>,
}

impl GenerationRequest {
    fn prompt(&self) -> String {
        build_prompt(&PromptRequest {
            transcript: &self.transcript,
            kind: self.kind,
            count: self.count,
            tone: self.tone,
            brand_voice: self.brand_voice.as_deref(),
            additional_context: self.additional_context.as_deref(),
        })
    }
}

/// Text generation the content pipeline depends on.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generates `request.count` pieces of one content type.
    async fn generate_content(&self, request: GenerationRequest) -> IntegrationResult<Vec<String>>;

    /// Extracts topics, quotes, summary and sentiment.
    async fn extract_insights(&self, transcript: &str) -> IntegrationResult<Insights>;
}

/// Generates several content types concurrently.
///
/// A type that fails yields an empty list; the others are unaffected.
/// Results keep the order of `types`.
pub async fn generate_multiple(
    generator: &dyn ContentGenerator,
    transcript: &str,
    types: &[(ContentKind, u32)],
    tone: Tone,
    brand_voice: Option<&str>,
) -> Vec<(ContentKind, Vec<String>)> {
    let jobs = types.iter().map(|&(kind, count)| {
        let request = GenerationRequest {
            transcript: transcript.to_string(),
            kind,
            count,
            tone,
            brand_voice: brand_voice.map(str::to_string),
            additional_context: None,
        };
        async move {
            match generator.generate_content(request).await {
                Ok(pieces) => (kind, pieces),
                Err(e) => {
                    tracing::error!(content_type = kind.as_str(), error = %e, "Failed to generate content");
                    (kind, Vec::new())
                }
            }
        }
    });

    futures::future::join_all(jobs).await
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Anthropic Messages API client.
#[derive(Clone)]
pub struct ClaudeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeClient {
    /// Builds a client from configuration.
    pub fn new(config: &AnthropicConfig) -> IntegrationResult<Self> {
        Ok(Self {
            http: http::client(DEFAULT_TIMEOUT.saturating_mul(4))?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    /// Sends one user message and returns the first text block.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> IntegrationResult<String> {
        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&MessagesRequest {
                model: &self.model,
                max_tokens,
                messages: [Message {
                    role: "user",
                    content: prompt,
                }],
            })
            .send()
            .await?;

        let body: MessagesResponse = http::read_json(
            PROVIDER,
            response,
            "/error/message",
            "Content generation failed",
        )
        .await?;

        match body.content.into_iter().next() {
            Some(ContentBlock::Text { text }) => Ok(text),
            _ => Err(IntegrationError::decode(
                PROVIDER,
                "Unexpected response type from Claude",
            )),
        }
    }
}

#[async_trait]
impl ContentGenerator for ClaudeClient {
    async fn generate_content(&self, request: GenerationRequest) -> IntegrationResult<Vec<String>> {
        let count = request.count.max(1);
        let text = self.complete(&request.prompt(), self.max_tokens).await?;
        let pieces = parse_content_response(&text, usize::try_from(count).unwrap_or(usize::MAX));
        tracing::debug!(
            content_type = request.kind.as_str(),
            requested = count,
            produced = pieces.len(),
            "Generated content"
        );
        Ok(pieces)
    }

    async fn extract_insights(&self, transcript: &str) -> IntegrationResult<Insights> {
        let text = self
            .complete(&insights_prompt(transcript), INSIGHTS_MAX_TOKENS)
            .await?;
        let insights = parse_insights(&text);
        if insights == Insights::default() {
            tracing::warn!("Failed to parse insights, using neutral defaults");
        }
        Ok(insights)
    }
}
