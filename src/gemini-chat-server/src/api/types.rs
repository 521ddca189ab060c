//! API request and response types.

use serde::{Deserialize, Serialize};

/// Query string accepted by `/generate` and `/stream`.
#[derive(Debug, Default, Deserialize)]
pub struct PromptQuery {
    /// Prompt text; missing or empty falls back to the endpoint default.
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
    pub uptime_seconds: u64,
    pub active_streams: usize,
}
