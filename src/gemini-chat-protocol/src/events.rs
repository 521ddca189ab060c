//! Named SSE events emitted by the relay.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, IntoStaticStr};

/// Static message carried by the `error` terminal event.
///
/// Upstream failure detail never reaches the client; it is logged server-side.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate content";

/// Status carried by the `end` terminal event.
pub const DONE_STATUS: &str = "done";

/// SSE event names used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum EventName {
    Thought,
    Message,
    End,
    Error,
}

impl EventName {
    /// All event names, in the order a client typically registers listeners.
    pub const ALL: [EventName; 4] = [Self::Thought, Self::Message, Self::End, Self::Error];

    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// Look up an event name as it appears in the `event:` field.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.as_str() == name)
    }

    /// Whether an event with this name closes the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End | Self::Error)
    }
}

/// Data of a `thought` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThoughtPayload {
    pub thought: String,
}

/// Data of a `message` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub text: String,
}

/// Data of the `end` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndPayload {
    pub status: String,
}

/// Data of the `error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

/// A decoded stream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Reasoning text from the model's thought channel.
    Thought(String),
    /// Answer text.
    Message(String),
    /// Graceful completion. Carries the status reported by the server.
    End(String),
    /// Failed generation. Carries the client-facing message.
    Error(String),
}

/// Failure to decode an SSE frame into a [`StreamEvent`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown event name: {0}")]
    UnknownEvent(String),

    #[error("invalid {event} payload: {source}")]
    InvalidPayload {
        event: EventName,
        #[source]
        source: serde_json::Error,
    },
}

impl StreamEvent {
    /// The `end` event with the `done` status.
    pub fn done() -> Self {
        Self::End(DONE_STATUS.to_string())
    }

    /// The `error` event with the static generation-failure message.
    pub fn generation_failed() -> Self {
        Self::Error(GENERATION_FAILED_MESSAGE.to_string())
    }

    pub fn name(&self) -> EventName {
        match self {
            Self::Thought(_) => EventName::Thought,
            Self::Message(_) => EventName::Message,
            Self::End(_) => EventName::End,
            Self::Error(_) => EventName::Error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.name().is_terminal()
    }

    /// The event's data field: a single-line JSON object.
    pub fn data(&self) -> String {
        match self {
            Self::Thought(thought) => encode(&ThoughtPayload {
                thought: thought.clone(),
            }),
            Self::Message(text) => encode(&MessagePayload { text: text.clone() }),
            Self::End(status) => encode(&EndPayload {
                status: status.clone(),
            }),
            Self::Error(error) => encode(&ErrorPayload {
                error: error.clone(),
            }),
        }
    }

    /// Decode an SSE frame from its `event:` name and `data:` payload.
    pub fn decode(name: &str, data: &str) -> Result<Self, DecodeError> {
        let event =
            EventName::parse(name).ok_or_else(|| DecodeError::UnknownEvent(name.to_string()))?;
        let invalid = |source: serde_json::Error| DecodeError::InvalidPayload { event, source };

        let decoded = match event {
            EventName::Thought => {
                Self::Thought(serde_json::from_str::<ThoughtPayload>(data).map_err(invalid)?.thought)
            }
            EventName::Message => {
                Self::Message(serde_json::from_str::<MessagePayload>(data).map_err(invalid)?.text)
            }
            EventName::End => {
                Self::End(serde_json::from_str::<EndPayload>(data).map_err(invalid)?.status)
            }
            EventName::Error => {
                Self::Error(serde_json::from_str::<ErrorPayload>(data).map_err(invalid)?.error)
            }
        };

        Ok(decoded)
    }
}

/// Payloads are single-field string structs, so serialization cannot fail.
fn encode<T: Serialize>(payload: &T) -> String {
    serde_json::to_string(payload).unwrap_or_default()
}
