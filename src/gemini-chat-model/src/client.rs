//! Gemini client implementation

use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::ReceiverStream;

use crate::models::{ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse};
use crate::{Chunk, ChunkStream, GeminiConfig, ModelError, ModelSource, Result};

/// Buffered chunks between the upstream reader task and the consumer.
const CHUNK_CHANNEL_CAPACITY: usize = 32;

/// Client for the Gemini `generateContent` REST API
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("config", &self.config)
            .finish()
    }
}

impl GeminiClient {
    /// Create a new client.
    ///
    /// No request is made here; a missing API key surfaces on the first call.
    pub fn new(config: GeminiConfig) -> Self {
        // Streams have no overall timeout; sync calls set one per request.
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, config }
    }

    /// URL of a model method, e.g. `{base}/models/gemini-2.5-flash:generateContent`.
    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            method
        )
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ModelError::MissingApiKey)
    }

    /// POST a request and fail on non-success status.
    async fn post(
        &self,
        url: &str,
        body: &GenerateContentRequest,
        request_timeout: Option<Duration>,
    ) -> Result<reqwest::Response> {
        let api_key = self.api_key()?;

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", api_key)
            .json(body);
        if let Some(t) = request_timeout {
            request = request.timeout(t);
        }

        tracing::debug!(url = %url, model = %self.config.model, "Sending Gemini request");

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, url = %url, "Failed to send request");
            ModelError::Request(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|envelope| envelope.error.to_string())
            .unwrap_or_else(|_| {
                // Include a preview of non-JSON bodies for debugging
                if body.chars().count() > 200 {
                    format!("{}...", body.chars().take(200).collect::<String>())
                } else {
                    body.clone()
                }
            });

        tracing::error!(status = %status, url = %url, body = %body, "Gemini request failed");
        Err(ModelError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Parse one streamed `data:` payload into a chunk.
fn parse_chunk(data: &str) -> Result<Chunk> {
    let response: GenerateContentResponse = serde_json::from_str(data).map_err(|e| {
        tracing::debug!(error = %e, data = %data, "Unparseable Gemini stream payload");
        ModelError::MalformedChunk(e.to_string())
    })?;

    if let Some(error) = response.error {
        return Err(ModelError::Upstream(error.to_string()));
    }

    Ok(Chunk::from(response))
}

#[async_trait]
impl ModelSource for GeminiClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint("generateContent");
        let body = GenerateContentRequest::from_prompt(prompt);

        let response = self
            .post(&url, &body, Some(self.config.request_timeout()))
            .await?;
        let response: GenerateContentResponse = response.json().await?;

        if let Some(error) = response.error {
            return Err(ModelError::Upstream(error.to_string()));
        }

        Ok(response.answer_text())
    }

    /// Each chunk must arrive within `chunk_timeout_secs`. Opening the
    /// stream has no timeout of its own; a stall before the response head is
    /// ended by the caller dropping the future.
    async fn stream(&self, prompt: &str) -> Result<ChunkStream> {
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let body = GenerateContentRequest::from_prompt(prompt)
            .with_thinking(self.config.include_thoughts, self.config.thinking_budget);

        let response = self.post(&url, &body, None).await?;

        let (tx, rx) = mpsc::channel::<Result<Chunk>>(CHUNK_CHANNEL_CAPACITY);
        let chunk_timeout = self.config.chunk_timeout();
        let chunk_timeout_secs = self.config.chunk_timeout_secs;

        // Spawn task to read the upstream SSE body
        let events = response.bytes_stream().eventsource();
        tokio::spawn(async move {
            let mut events = std::pin::pin!(events);
            let mut received = 0usize;

            loop {
                let next = tokio::select! {
                    // Consumer dropped the stream; stop reading upstream.
                    _ = tx.closed() => {
                        tracing::debug!(received, "Chunk consumer went away, dropping upstream");
                        break;
                    }
                    next = timeout(chunk_timeout, events.next()) => next,
                };

                let event = match next {
                    Ok(Some(Ok(event))) => event,
                    Ok(None) => break,
                    Ok(Some(Err(e))) => {
                        let _ = tx.send(Err(ModelError::Stream(e.to_string()))).await;
                        break;
                    }
                    Err(_) => {
                        let _ = tx.send(Err(ModelError::Timeout(chunk_timeout_secs))).await;
                        break;
                    }
                };

                if event.data.is_empty() {
                    continue;
                }

                let chunk = parse_chunk(&event.data);
                let failed = chunk.is_err();
                received += 1;

                if tx.send(chunk).await.is_err() || failed {
                    break;
                }
            }

            tracing::debug!(received, "Gemini stream reader finished");
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
