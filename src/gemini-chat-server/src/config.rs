//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use gemini_chat_model::GeminiConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default port, matching the browser client's development proxy.
pub const DEFAULT_PORT: u16 = 3080;

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:3080").
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Upstream model configuration.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Static file serving for the browser client.
    #[serde(default)]
    pub static_files: Option<StaticFilesConfig>,

    /// CORS origins (empty = allow all).
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Interval between SSE keep-alive comments, in seconds.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    /// Events buffered between a relay and its HTTP response.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

fn default_listen_addr() -> String {
    format!("0.0.0.0:{DEFAULT_PORT}")
}

fn default_keep_alive_secs() -> u64 {
    15
}

fn default_channel_capacity() -> usize {
    100
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            gemini: GeminiConfig::default(),
            static_files: None,
            cors_origins: vec![],
            keep_alive_secs: default_keep_alive_secs(),
            channel_capacity: default_channel_capacity(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.keep_alive_secs > 0, "keep_alive_secs must be at least 1");
        anyhow::ensure!(self.channel_capacity > 0, "channel_capacity must be at least 1");
        self.gemini.validate()?;
        Ok(())
    }

    /// Load from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Overlay values found through `lookup` onto this config.
    ///
    /// `GEMINI_CHAT_LISTEN_ADDR` wins over `PORT`. An API key already present
    /// (e.g. from a config file) is only replaced by a non-empty variable.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.is_empty()) {
            self.gemini.api_key = Some(key);
        }

        if let Some(model) = lookup("GEMINI_MODEL").filter(|m| !m.is_empty()) {
            self.gemini.model = model;
        }

        if let Some(url) = lookup("GEMINI_BASE_URL").filter(|u| !u.is_empty()) {
            self.gemini.base_url = url;
        }

        if let Some(port) = lookup("PORT") {
            match port.parse::<u16>() {
                Ok(port) => self.set_port(port),
                Err(_) => warn!(value = %port, "Ignoring invalid PORT"),
            }
        }

        if let Some(addr) = lookup("GEMINI_CHAT_LISTEN_ADDR") {
            self.listen_addr = addr;
        }

        if let Some(dir) = lookup("GEMINI_CHAT_STATIC_DIR") {
            self.static_files = Some(StaticFilesConfig::new(dir));
        }
    }

    /// Replace the port of the listen address, keeping its host.
    pub fn set_port(&mut self, port: u16) {
        let host = self
            .listen_addr
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or("0.0.0.0");
        self.listen_addr = format!("{host}:{port}");
    }

    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn shutdown_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

/// Static file serving configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticFilesConfig {
    /// Root directory holding the built browser client.
    pub root: PathBuf,
    /// File served for paths that match nothing else.
    #[serde(default = "default_index")]
    pub index: String,
}

fn default_index() -> String {
    "index.html".to_string()
}

impl StaticFilesConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index: default_index(),
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use pretty_assertions::assert_eq;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:3080");
        assert_eq!(config.keep_alive_interval(), Duration::from_secs(15));
        assert_eq!(config.channel_capacity, 100);
        assert!(config.static_files.is_none());
        assert!(!config.gemini.has_api_key());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServerConfig::default();
        config.apply_env(env(&[
            ("GEMINI_API_KEY", "key-1"),
            ("GEMINI_MODEL", "gemini-2.5-pro"),
            ("PORT", "8081"),
            ("GEMINI_CHAT_STATIC_DIR", "/srv/client"),
        ]));

        assert_eq!(config.gemini.api_key.as_deref(), Some("key-1"));
        assert_eq!(config.gemini.model, "gemini-2.5-pro");
        assert_eq!(config.listen_addr, "0.0.0.0:8081");
        let static_files = config.static_files.unwrap();
        assert_eq!(static_files.root, PathBuf::from("/srv/client"));
        assert_eq!(
            static_files.index_path(),
            PathBuf::from("/srv/client/index.html")
        );
    }

    #[test]
    fn test_listen_addr_wins_over_port() {
        let mut config = ServerConfig::default();
        config.apply_env(env(&[
            ("PORT", "8081"),
            ("GEMINI_CHAT_LISTEN_ADDR", "127.0.0.1:9000"),
        ]));
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
    }

    #[test]
    fn test_invalid_port_is_ignored() {
        let mut config = ServerConfig::default();
        config.apply_env(env(&[("PORT", "not-a-port")]));
        assert_eq!(config.listen_addr, "0.0.0.0:3080");
    }

    #[test]
    fn test_empty_key_keeps_file_key() {
        let mut config = ServerConfig::default();
        config.gemini.api_key = Some("from-file".into());
        config.apply_env(env(&[("GEMINI_API_KEY", "")]));
        assert_eq!(config.gemini.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_set_port_keeps_host() {
        let mut config = ServerConfig {
            listen_addr: "127.0.0.1:3080".into(),
            ..Default::default()
        };
        config.set_port(4000);
        assert_eq!(config.listen_addr, "127.0.0.1:4000");
    }

    #[test]
    fn test_load_rejects_zero_durations() {
        let dir = tempfile::tempdir().unwrap();

        let path = dir.path().join("keep_alive.json");
        std::fs::write(&path, r#"{"keep_alive_secs": 0}"#).unwrap();
        let err = ServerConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("keep_alive_secs"));

        let path = dir.path().join("chunk_timeout.json");
        std::fs::write(&path, r#"{"gemini": {"chunk_timeout_secs": 0}}"#).unwrap();
        let err = ServerConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("chunk_timeout_secs"));

        let path = dir.path().join("capacity.json");
        std::fs::write(&path, r#"{"channel_capacity": 0}"#).unwrap();
        assert!(ServerConfig::load(&path).is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.json");
        std::fs::write(
            &path,
            r#"{"listen_addr": "127.0.0.1:5000", "gemini": {"model": "gemini-2.5-pro"}}"#,
        )
        .unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:5000");
        assert_eq!(config.gemini.model, "gemini-2.5-pro");
        assert_eq!(config.gemini.thinking_budget, 1024);
        assert_eq!(config.shutdown_timeout, 30);
    }
}
