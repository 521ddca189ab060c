//! SSE consumer for the relay's `/api/stream` endpoint.

use eventsource_stream::Eventsource;
use futures::StreamExt;
use gemini_chat_protocol::{API_PREFIX, DecodeError, STREAM_PATH, StreamEvent};
use reqwest::header::ACCEPT;
use tracing::{debug, warn};

use crate::turn::{ChatMessage, Turn, TurnStatus};
use crate::{ClientError, Result};

/// Default relay server address.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3080";

/// How a streamed turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEnding {
    /// The server sent `end`.
    Completed,
    /// The server sent `error` with this message.
    Failed(String),
    /// The connection dropped or a payload could not be decoded mid-turn.
    Interrupted(String),
}

/// Result of one streamed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Record of the turn; `None` when nothing arrived.
    pub message: Option<ChatMessage>,
    pub ending: TurnEnding,
}

/// Opens one event stream per prompt and folds it into a [`Turn`].
#[derive(Debug, Clone)]
pub struct StreamConsumer {
    client: reqwest::Client,
    base_url: String,
}

impl StreamConsumer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the stream for `prompt`.
    pub fn stream_url(&self, prompt: &str) -> String {
        format!(
            "{}{}{}?prompt={}",
            self.base_url,
            API_PREFIX,
            STREAM_PATH,
            urlencoding::encode(prompt)
        )
    }

    /// Stream one turn, calling `on_event` for each decoded event.
    ///
    /// The connection is closed once the turn finishes. Failing to connect,
    /// or a transport error before any event, is an error; anything that goes
    /// wrong after that finalizes the turn with what has arrived.
    pub async fn stream_turn<F>(&self, prompt: &str, mut on_event: F) -> Result<TurnOutcome>
    where
        F: FnMut(&StreamEvent),
    {
        let url = self.stream_url(prompt);
        debug!(url = %url, "Opening event stream");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|source| ClientError::Connect {
                url: self.base_url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        let mut events = Box::pin(response.bytes_stream().eventsource());
        let mut turn = Turn::new();
        let mut received = false;

        let ending = loop {
            let frame = match events.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) if !received => return Err(ClientError::Stream(e.to_string())),
                Some(Err(e)) => {
                    warn!(error = %e, "Event stream failed mid-turn");
                    break TurnEnding::Interrupted(e.to_string());
                }
                None if !received => {
                    return Err(ClientError::Stream(
                        "stream closed before any event".to_string(),
                    ));
                }
                None => break TurnEnding::Interrupted("stream closed early".to_string()),
            };
            received = true;

            let event = match StreamEvent::decode(&frame.event, &frame.data) {
                Ok(event) => event,
                Err(DecodeError::UnknownEvent(name)) => {
                    debug!(event = %name, "Ignoring unknown event");
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "Undecodable event payload");
                    break TurnEnding::Interrupted(e.to_string());
                }
            };

            on_event(&event);

            if turn.apply(&event) == TurnStatus::Finished {
                break match event {
                    StreamEvent::Error(message) => TurnEnding::Failed(message),
                    _ => TurnEnding::Completed,
                };
            }
        };

        drop(events);

        Ok(TurnOutcome {
            message: turn.finish(),
            ending,
        })
    }
}
