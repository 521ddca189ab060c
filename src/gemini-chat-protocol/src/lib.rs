//! Gemini Chat Protocol - SSE wire types between the relay server and clients.
//!
//! A stream carries zero or more `thought` / `message` events followed by
//! exactly one terminal event (`end` or `error`). Every event's data field is
//! a single-line JSON object.

pub mod events;
pub mod routes;

#[cfg(test)]
mod tests;

// Re-exports
pub use events::{
    DONE_STATUS, DecodeError, EndPayload, ErrorPayload, EventName, GENERATION_FAILED_MESSAGE,
    MessagePayload, StreamEvent, ThoughtPayload,
};
pub use routes::{
    API_PREFIX, DEFAULT_GENERATE_PROMPT, DEFAULT_STREAM_PROMPT, GENERATE_PATH, HEALTH_PATH,
    STREAM_PATH, resolve_prompt,
};
