//! Application state management.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use gemini_chat_model::{GeminiClient, ModelSource};
use tracing::warn;

use crate::config::ServerConfig;

/// Application state shared across request handlers.
pub struct AppState {
    /// Server configuration.
    pub config: ServerConfig,
    /// Source every request generates from.
    pub model: Arc<dyn ModelSource>,
    /// Server start time.
    start_time: Instant,
    /// Relays currently writing to a client.
    active_streams: Arc<AtomicUsize>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("model", &self.model.model())
            .field("start_time", &self.start_time)
            .field("active_streams", &self.active_streams())
            .finish()
    }
}

impl AppState {
    /// Create state backed by the Gemini REST API.
    pub fn new(config: ServerConfig) -> Self {
        if !config.gemini.has_api_key() {
            warn!("GEMINI_API_KEY is not set; generation requests will fail");
        }

        let client = GeminiClient::new(config.gemini.clone());
        Self::with_model(config, Arc::new(client))
    }

    /// Create state backed by an arbitrary model source.
    pub fn with_model(config: ServerConfig, model: Arc<dyn ModelSource>) -> Self {
        Self {
            config,
            model,
            start_time: Instant::now(),
            active_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get server uptime.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn active_streams(&self) -> usize {
        self.active_streams.load(Ordering::SeqCst)
    }

    /// Count a relay as active until the returned guard drops.
    pub fn track_stream(&self) -> StreamGuard {
        self.active_streams.fetch_add(1, Ordering::SeqCst);
        StreamGuard {
            counter: Arc::clone(&self.active_streams),
        }
    }
}

/// Decrements the active stream count on drop.
#[derive(Debug)]
pub struct StreamGuard {
    counter: Arc<AtomicUsize>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}
