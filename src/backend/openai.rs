//! OpenAI-compatible HTTP backend
//!
//! Implements both backend seams against the OpenAI REST API (or any
//! compatible endpoint via `base_url`). Embeddings go through
//! `/v1/embeddings`, completions through `/v1/chat/completions`; image
//! prompts attach the JPEG as a base64 data URL.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{BackendError, Completion, EmbeddingBackend, EmbeddingBatch, GenerationBackend};

/// Configuration for the OpenAI backend
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// Base URL for the API (e.g., "https://api.openai.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key; empty means unconfigured
    #[serde(default)]
    pub api_key: String,
    /// Model used for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Model used for chat completions (must accept image input)
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    /// Vector dimension the embedding model produces
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Maximum retry attempts for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_dimension() -> usize {
    1536
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
            dimension: default_dimension(),
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_max_retries(),
        }
    }
}

/// HTTP client for the OpenAI API
pub struct OpenAiBackend {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiBackend {
    /// Create a new backend with the given configuration
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn classify(e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout
        } else if e.is_connect() {
            BackendError::Unavailable(e.to_string())
        } else {
            BackendError::Request(e)
        }
    }

    /// Send a POST request with retry on transient failures
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, BackendError> {
        if self.config.api_key.is_empty() {
            return Err(BackendError::NotConfigured);
        }

        let url = format!("{}{}", self.config.base_url, path);
        let mut last_error = BackendError::Unavailable("no attempts made".to_string());

        for attempt in 0..self.config.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 4s, 9s...
                let delay = std::time::Duration::from_secs((attempt as u64).pow(2));
                tokio::time::sleep(delay).await;
            }

            match self
                .client
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(body)
                .send()
                .await
            {
                Ok(response) => {
                    if response.status().is_success() {
                        return response.json().await.map_err(BackendError::Request);
                    } else if response.status().as_u16() == 429 {
                        last_error = BackendError::Api {
                            status: 429,
                            message: "rate limited".to_string(),
                        };
                        continue;
                    } else {
                        let status = response.status();
                        let text = response.text().await.unwrap_or_default();
                        return Err(BackendError::Api {
                            status: status.as_u16(),
                            message: text,
                        });
                    }
                }
                Err(e) => {
                    last_error = Self::classify(e);
                    continue;
                }
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAiBackend {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<EmbeddingBatch, BackendError> {
        let body = json!({
            "model": self.config.embedding_model,
            "input": texts,
        });

        let value = self.post_json("/v1/embeddings", &body).await?;
        let parsed: EmbeddingsResponse = serde_json::from_value(value)
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        let mut rows: Vec<EmbeddingData> = parsed.data;
        rows.sort_by_key(|d| d.index);

        let vectors: Vec<Vec<f32>> = rows.into_iter().map(|d| d.embedding).collect();
        if vectors.len() != texts.len() {
            return Err(BackendError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        Ok(EmbeddingBatch {
            vectors,
            tokens_used: parsed.usage.total_tokens,
        })
    }
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Completion, BackendError> {
        let body = json!({
            "model": self.config.chat_model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let value = self.post_json("/v1/chat/completions", &body).await?;
        parse_chat_response(value)
    }

    async fn complete_with_image(
        &self,
        prompt: &str,
        jpeg: &[u8],
    ) -> Result<Completion, BackendError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(jpeg);
        let body = json!({
            "model": self.config.chat_model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": prompt},
                    {"type": "image_url", "image_url": {
                        "url": format!("data:image/jpeg;base64,{}", encoded)
                    }},
                ],
            }],
            "max_tokens": 1000,
        });

        let value = self.post_json("/v1/chat/completions", &body).await?;
        parse_chat_response(value)
    }
}

fn parse_chat_response(value: Value) -> Result<Completion, BackendError> {
    let parsed: ChatResponse =
        serde_json::from_value(value).map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::InvalidResponse("no choices in response".to_string()))?;

    Ok(Completion {
        text: choice.message.content,
        tokens_used: parsed.usage.total_tokens,
    })
}

// ============================================
// Response DTOs
// ============================================

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize, Serialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}
