//! Gemini Chat CLI library module.
//!
//! This module provides the terminal chat client:
//! - `consumer` - SSE consumer for the relay's stream endpoint
//! - `turn` - Turn accumulation and conversation history
//! - `styled_output` - Themed terminal output for the live view

pub mod consumer;
pub mod styled_output;
pub mod turn;

pub use consumer::{DEFAULT_SERVER_URL, StreamConsumer, TurnEnding, TurnOutcome};
pub use turn::{ChatMessage, Conversation, Role, Turn, TurnStatus};

/// Client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Server returned HTTP {0}")]
    Status(u16),

    #[error("Event stream failed: {0}")]
    Stream(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
