//! Server-Sent Events streaming endpoint.
//!
//! Each `/stream` request runs its relay on a separate task that writes into
//! a bounded channel. The SSE response body reads from that channel, so when
//! the client disconnects axum drops the body, the channel closes and the
//! relay stops pulling from the model.

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Extension, Router,
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::stream::Stream;
use gemini_chat_protocol::{DEFAULT_STREAM_PROMPT, STREAM_PATH, StreamEvent, resolve_prompt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;

use crate::api::PromptQuery;
use crate::middleware::RequestId;
use crate::relay::{EventSink, SinkClosed, relay_stream};
use crate::state::AppState;

/// Item type of the SSE response body.
pub type SseItem = Result<Event, Infallible>;

/// Create streaming routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(STREAM_PATH, get(stream_generation))
}

/// Convert a relay event into an SSE frame.
pub fn to_sse_event(event: &StreamEvent) -> Event {
    Event::default()
        .event(event.name().as_str())
        .data(event.data())
}

/// Event sink backed by the channel feeding one SSE response.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<SseItem>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<SseItem>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn send(&mut self, event: StreamEvent) -> Result<(), SinkClosed> {
        self.tx
            .send(Ok(to_sse_event(&event)))
            .await
            .map_err(|_| SinkClosed)
    }

    async fn closed(&self) {
        self.tx.closed().await
    }
}

/// Stream a generation for `?prompt=` as SSE events.
///
/// Always answers 200; failures arrive as an `error` event.
async fn stream_generation(
    State(state): State<Arc<AppState>>,
    request_id: Option<Extension<RequestId>>,
    Query(query): Query<PromptQuery>,
) -> Sse<impl Stream<Item = SseItem>> {
    let prompt = resolve_prompt(query.prompt.as_deref(), DEFAULT_STREAM_PROMPT);
    let (tx, rx) = mpsc::channel::<SseItem>(state.config.channel_capacity.max(1));

    let request_id = request_id.map(|Extension(RequestId(id))| id).unwrap_or_default();
    let span = tracing::info_span!(
        "relay",
        request_id = %request_id,
        model = %state.model.model(),
        prompt_len = prompt.len(),
    );

    let guard = state.track_stream();
    let model = Arc::clone(&state.model);
    tokio::spawn(
        async move {
            let _guard = guard;
            relay_stream(model.as_ref(), &prompt, ChannelSink::new(tx)).await;
        }
        .instrument(span),
    );

    Sse::new(ReceiverStream::new(rx))
        .keep_alive(KeepAlive::new().interval(state.config.keep_alive_interval()))
}
