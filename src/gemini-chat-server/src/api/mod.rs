//! REST API routes and handlers.

mod generate;
mod health;
pub mod types;

use std::sync::Arc;

use axum::{Router, http::Uri, routing::get};
use gemini_chat_protocol::{GENERATE_PATH, HEALTH_PATH};

use crate::error::AppError;
use crate::state::AppState;

pub use types::{HealthResponse, PromptQuery};

/// Create the API routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(HEALTH_PATH, get(health::health_check))
        .route(GENERATE_PATH, get(generate::generate))
}

/// Fallback for unknown paths when no static client is served.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
