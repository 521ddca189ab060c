//! HTTP routes exposed by the relay server.

/// Common prefix of every API route.
pub const API_PREFIX: &str = "/api";

/// Synchronous generation, plain-text response.
pub const GENERATE_PATH: &str = "/generate";

/// Streaming generation, SSE response.
pub const STREAM_PATH: &str = "/stream";

/// Liveness probe.
pub const HEALTH_PATH: &str = "/health";

/// Prompt used by `/generate` when the request carries none.
pub const DEFAULT_GENERATE_PROMPT: &str = "Hello, Gemini!";

/// Prompt used by `/stream` when the request carries none.
pub const DEFAULT_STREAM_PROMPT: &str = "Write a short story about a space pirate.";

/// Pick the request prompt, falling back to `default` when it is absent or empty.
pub fn resolve_prompt(prompt: Option<&str>, default: &str) -> String {
    match prompt {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => default.to_string(),
    }
}
