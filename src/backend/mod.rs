//! Model backend abstractions
//!
//! The pipeline talks to two seams: an embedding backend that turns text
//! batches into vectors, and a generation backend that completes prompts
//! (optionally with an image attached). The OpenAI-compatible HTTP
//! implementation lives in [`openai`]; tests substitute in-process mocks.

pub mod openai;

pub use openai::{OpenAiBackend, OpenAiConfig};

use async_trait::async_trait;
use thiserror::Error;

/// Result of embedding a batch of texts
#[derive(Debug, Clone)]
pub struct EmbeddingBatch {
    /// One vector per input text, in input order
    pub vectors: Vec<Vec<f32>>,
    /// Token count the backend billed for the batch
    pub tokens_used: u64,
}

/// Result of a completion call
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    /// Total tokens billed (prompt + completion)
    pub tokens_used: u64,
}

/// Errors from backend calls
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend not configured")]
    NotConfigured,

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid backend response: {0}")]
    InvalidResponse(String),
}

/// Turns text into fixed-dimension vectors
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Vector dimension every returned embedding has
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, preserving input order
    async fn embed_batch(&self, texts: &[String]) -> Result<EmbeddingBatch, BackendError>;
}

/// Completes prompts against a chat model
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Whether the backend has credentials to serve requests
    fn is_configured(&self) -> bool;

    /// Complete a text prompt
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Completion, BackendError>;

    /// Complete a prompt with a JPEG image attached
    async fn complete_with_image(
        &self,
        prompt: &str,
        jpeg: &[u8],
    ) -> Result<Completion, BackendError>;
}
