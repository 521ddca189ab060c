//! Stream relay.
//!
//! Pumps a model's chunk stream into an [`EventSink`], classifying each part
//! as a `thought` or `message` event, then closes with exactly one terminal
//! event: `end` on completion, `error` on any failure.
//!
//! The terminal guarantee is structural. [`Relay::pump`] can only write
//! thought and message events, and [`Relay::finish`] consumes the relay, so
//! nothing can be written after the terminal event.

use async_trait::async_trait;
use futures::StreamExt;
use gemini_chat_model::{ModelError, ModelSource, Part};
use gemini_chat_protocol::StreamEvent;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// The receiving side of a sink went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event sink closed")]
pub struct SinkClosed;

/// Destination for relayed events, one per client connection.
#[async_trait]
pub trait EventSink: Send {
    /// Write one event. Fails once the client has gone.
    async fn send(&mut self, event: StreamEvent) -> Result<(), SinkClosed>;

    /// Resolves when the client has gone.
    async fn closed(&self);
}

/// Why a relay stopped before the model finished.
#[derive(Debug, Error)]
enum RelayError {
    #[error("model failed: {0}")]
    Model(#[from] ModelError),

    #[error(transparent)]
    Sink(#[from] SinkClosed),
}

/// How a relay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Upstream finished; `end` was written.
    Completed,
    /// Upstream failed; `error` was written.
    Failed,
    /// Client went away; the terminal event was attempted and dropped.
    Disconnected,
}

/// Counters for one relayed generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
    pub outcome: RelayOutcome,
    pub thoughts: usize,
    pub messages: usize,
    /// Parts with no text, or empty text.
    pub skipped: usize,
}

/// Map a part to the event it produces, if any.
///
/// Parts without text, or with empty text, produce nothing.
pub fn classify(part: &Part) -> Option<StreamEvent> {
    let text = part.non_empty_text()?.to_string();
    Some(if part.is_thought {
        StreamEvent::Thought(text)
    } else {
        StreamEvent::Message(text)
    })
}

/// One relayed generation bound to one sink.
#[derive(Debug)]
pub struct Relay<S> {
    sink: S,
    thoughts: usize,
    messages: usize,
    skipped: usize,
}

impl<S: EventSink> Relay<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            thoughts: 0,
            messages: 0,
            skipped: 0,
        }
    }

    /// Forward every classified part to the sink, in upstream order.
    ///
    /// Stops pulling from the model as soon as the sink reports closed.
    async fn pump(&mut self, source: &dyn ModelSource, prompt: &str) -> Result<(), RelayError> {
        let mut chunks = tokio::select! {
            biased;
            _ = self.sink.closed() => return Err(SinkClosed.into()),
            opened = source.stream(prompt) => opened?,
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = self.sink.closed() => return Err(SinkClosed.into()),
                next = chunks.next() => next,
            };

            let Some(chunk) = next else {
                return Ok(());
            };

            for part in &chunk?.parts {
                let Some(event) = classify(part) else {
                    self.skipped += 1;
                    continue;
                };

                match event {
                    StreamEvent::Thought(_) => self.thoughts += 1,
                    _ => self.messages += 1,
                }
                self.sink.send(event).await?;
            }
        }
    }

    /// Write the single terminal event and release the sink.
    async fn finish(mut self, result: Result<(), RelayError>) -> RelayReport {
        let (terminal, outcome) = match result {
            Ok(()) => (StreamEvent::done(), RelayOutcome::Completed),
            Err(RelayError::Sink(_)) => {
                (StreamEvent::generation_failed(), RelayOutcome::Disconnected)
            }
            Err(RelayError::Model(e)) => {
                error!(error = %e, "Generation failed");
                (StreamEvent::generation_failed(), RelayOutcome::Failed)
            }
        };

        if self.sink.send(terminal).await.is_err() {
            debug!("Client gone, terminal event dropped");
        }

        RelayReport {
            outcome,
            thoughts: self.thoughts,
            messages: self.messages,
            skipped: self.skipped,
        }
    }
}

/// Relay one streaming generation for `prompt` into `sink`.
///
/// Always writes exactly one terminal event, unless the client has already
/// gone, in which case that write is dropped.
pub async fn relay_stream<S: EventSink>(
    source: &dyn ModelSource,
    prompt: &str,
    sink: S,
) -> RelayReport {
    let mut relay = Relay::new(sink);
    let result = relay.pump(source, prompt).await;
    let report = relay.finish(result).await;

    match report.outcome {
        RelayOutcome::Completed => info!(
            thoughts = report.thoughts,
            messages = report.messages,
            skipped = report.skipped,
            "Stream completed"
        ),
        RelayOutcome::Failed => warn!(
            thoughts = report.thoughts,
            messages = report.messages,
            "Stream failed"
        ),
        RelayOutcome::Disconnected => info!(
            thoughts = report.thoughts,
            messages = report.messages,
            "Client disconnected, stream cancelled"
        ),
    }

    report
}
