//! Model source for Gemini Chat
//!
//! This crate turns a prompt into either a complete answer or a lazy stream
//! of [`Chunk`]s whose parts are tagged as thought or answer text. The relay
//! server only sees the [`ModelSource`] trait; [`GeminiClient`] is the
//! production implementation over the Gemini REST API.

mod client;
mod config;
pub mod mock;
mod models;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

pub use client::GeminiClient;
pub use config::GeminiConfig;
pub use models::{Chunk, Part};

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default token budget for the thought channel.
pub const DEFAULT_THINKING_BUDGET: i32 = 1024;

/// Error types for model operations
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Gemini API key is not configured. Set GEMINI_API_KEY.")]
    MissingApiKey,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Malformed chunk: {0}")]
    MalformedChunk(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("No data received for {0} seconds")]
    Timeout(u64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ModelError {
    /// Whether the failure was a stalled or timed-out upstream.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Request(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Lazy, finite sequence of chunks for one generation.
///
/// Dropping the stream stops reading from the upstream.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Chunk>> + Send>>;

/// A source of generated text.
#[async_trait]
pub trait ModelSource: Send + Sync {
    /// Get the model name.
    fn model(&self) -> &str;

    /// Generate the complete answer for a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Start a streaming generation for a prompt.
    async fn stream(&self, prompt: &str) -> Result<ChunkStream>;
}
