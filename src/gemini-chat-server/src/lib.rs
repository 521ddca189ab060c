//! Gemini Chat Server - HTTP relay between browsers and the Gemini API.
//!
//! This crate provides:
//! - `GET /api/generate`: the complete answer as plain text
//! - `GET /api/stream`: thoughts and answer text as named SSE events,
//!   closed by exactly one `end` or `error` event
//! - `GET /api/health`: liveness and uptime
//! - Static file serving for the browser client

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod relay;
pub mod state;
pub mod streaming;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use gemini_chat_protocol::API_PREFIX;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use config::{ServerConfig, StaticFilesConfig};
pub use error::{AppError, AppResult};
pub use relay::{EventSink, RelayOutcome, RelayReport, SinkClosed, relay_stream};
pub use state::AppState;

/// Run the server with graceful shutdown support.
///
/// Once `shutdown` resolves, in-flight requests get `shutdown_timeout`
/// seconds to finish before open streams are dropped.
pub async fn run_with_shutdown<F>(config: ServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = config.listen_addr.parse()?;
    let grace = config.shutdown_timeout_duration();

    let state = Arc::new(AppState::new(config));
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Starting Gemini chat server on {}", listener.local_addr()?);

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        shutdown.await;
        trigger.cancel();
    });

    let graceful = token.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { graceful.cancelled().await })
        .into_future();

    tokio::select! {
        result = server => result?,
        _ = async {
            token.cancelled().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!("Graceful shutdown timed out after {}s, dropping open streams", grace.as_secs());
        }
    }

    info!("Server shut down");
    Ok(())
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    create_router_with_state(Arc::new(state))
}

/// Create the application router with an Arc-wrapped state.
pub fn create_router_with_state(state: Arc<AppState>) -> Router {
    let api_routes = api::routes().merge(streaming::routes());
    let router = Router::new().nest(API_PREFIX, api_routes);

    let router = match &state.config.static_files {
        Some(static_files) => {
            info!(root = %static_files.root.display(), "Serving static files");
            router.fallback_service(
                ServeDir::new(&static_files.root)
                    .fallback(ServeFile::new(static_files.index_path())),
            )
        }
        None => router.fallback(api::not_found),
    };

    let cors = middleware::cors_layer(&state.config.cors_origins);

    router
        .layer(axum::middleware::from_fn(middleware::timing_middleware))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
