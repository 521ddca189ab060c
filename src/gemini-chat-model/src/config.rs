//! Gemini client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_GEMINI_URL, DEFAULT_MODEL, DEFAULT_THINKING_BUDGET, ModelError, Result};

/// Gemini client configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key sent as `x-goog-api-key`. Never serialized back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Model identifier (e.g., "gemini-2.5-flash").
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the REST API, up to and including the version segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Ask the model to return its thought parts when streaming.
    #[serde(default = "default_true")]
    pub include_thoughts: bool,

    /// Token budget for thinking when streaming.
    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: i32,

    /// Seconds to wait for the next streamed chunk before giving up.
    #[serde(default = "default_chunk_timeout")]
    pub chunk_timeout_secs: u64,

    /// Seconds allowed for a complete non-streaming request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Seconds allowed to establish the connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_GEMINI_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_thinking_budget() -> i32 {
    DEFAULT_THINKING_BUDGET
}

fn default_chunk_timeout() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    300 // 5 minutes
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            include_thoughts: true,
            thinking_budget: default_thinking_budget(),
            chunk_timeout_secs: default_chunk_timeout(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("include_thoughts", &self.include_thoughts)
            .field("thinking_budget", &self.thinking_budget)
            .field("chunk_timeout_secs", &self.chunk_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl GeminiConfig {
    /// Creates a config with the given API key and defaults elsewhere.
    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Default::default()
        }
    }

    /// Whether a non-empty API key is present.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Reject timeouts of zero seconds, which would fail every request.
    pub fn validate(&self) -> Result<()> {
        let zero = [
            ("chunk_timeout_secs", self.chunk_timeout_secs),
            ("request_timeout_secs", self.request_timeout_secs),
            ("connect_timeout_secs", self.connect_timeout_secs),
        ]
        .into_iter()
        .find(|(_, secs)| *secs == 0);

        match zero {
            Some((field, _)) => Err(ModelError::InvalidConfig(format!(
                "{field} must be at least 1"
            ))),
            None => Ok(()),
        }
    }

    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeminiConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert!(config.include_thoughts);
        assert_eq!(config.thinking_budget, 1024);
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_api_key_is_redacted_and_not_serialized() {
        let config = GeminiConfig::with_api_key("secret-key");
        assert!(config.has_api_key());
        assert!(!format!("{config:?}").contains("secret-key"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-key"));
        assert!(!json.contains("api_key"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GeminiConfig =
            serde_json::from_str(r#"{"api_key": "k", "model": "gemini-2.5-pro"}"#).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.base_url, DEFAULT_GEMINI_URL);
        assert_eq!(config.chunk_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_timeouts_are_rejected() {
        assert!(GeminiConfig::default().validate().is_ok());

        let config = GeminiConfig {
            chunk_timeout_secs: 0,
            ..Default::default()
        };
        match config.validate() {
            Err(ModelError::InvalidConfig(message)) => {
                assert!(message.contains("chunk_timeout_secs"))
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let config = GeminiConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_key_is_not_a_key() {
        let config = GeminiConfig::with_api_key("");
        assert!(!config.has_api_key());
    }
}
