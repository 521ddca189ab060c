//! One-shot generation endpoint.

use std::sync::Arc;

use axum::extract::{Query, State};
use gemini_chat_protocol::{DEFAULT_GENERATE_PROMPT, resolve_prompt};
use tracing::{error, info};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

use super::types::PromptQuery;

/// Return the complete answer for `?prompt=` as plain text.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PromptQuery>,
) -> AppResult<String> {
    let prompt = resolve_prompt(query.prompt.as_deref(), DEFAULT_GENERATE_PROMPT);

    let text = state.model.generate(&prompt).await.map_err(|e| {
        error!(error = %e, model = %state.model.model(), "Generation failed");
        AppError::from(e)
    })?;

    info!(prompt_len = prompt.len(), answer_len = text.len(), "Generation completed");
    Ok(text)
}
