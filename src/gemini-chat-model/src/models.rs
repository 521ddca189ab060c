//! Model types for the Gemini generateContent API

use serde::{Deserialize, Serialize};

// =============================================================================
// CHUNKS
// =============================================================================

/// Smallest classified unit of generated text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Part {
    /// Text payload, absent for non-text parts.
    pub text: Option<String>,
    /// Whether the part belongs to the model's thought channel.
    pub is_thought: bool,
}

impl Part {
    /// Create an answer part
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            is_thought: false,
        }
    }

    /// Create a thought part
    pub fn thought(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            is_thought: true,
        }
    }

    /// The text if present and non-empty.
    pub fn non_empty_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// One unit of incremental output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chunk {
    pub parts: Vec<Part>,
}

impl Chunk {
    pub fn new(parts: Vec<Part>) -> Self {
        Self { parts }
    }
}

impl From<GenerateContentResponse> for Chunk {
    fn from(response: GenerateContentResponse) -> Self {
        let parts = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| Part {
                        text: p.text,
                        is_thought: p.thought.unwrap_or(false),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { parts }
    }
}

// =============================================================================
// REQUEST
// =============================================================================

/// Request body for `generateContent` and `streamGenerateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// A single user turn carrying `prompt`.
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![ContentPart {
                    text: Some(prompt.to_string()),
                    thought: None,
                }],
            }],
            generation_config: None,
        }
    }

    pub fn with_thinking(mut self, include_thoughts: bool, thinking_budget: i32) -> Self {
        self.generation_config = Some(GenerationConfig {
            thinking_config: Some(ThinkingConfig {
                include_thoughts,
                thinking_budget,
            }),
        });
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ContentPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ThinkingConfig {
    pub include_thoughts: bool,
    pub thinking_budget: i32,
}

// =============================================================================
// RESPONSE
// =============================================================================

/// Response body, and the data of each streamed SSE event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    #[allow(dead_code)]
    pub model_version: Option<String>,
    /// Present when the API reports a failure inside a 200 stream.
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

impl GenerateContentResponse {
    /// Concatenated answer text of the first candidate, thought parts excluded.
    pub fn answer_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| !p.thought.unwrap_or(false))
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    #[allow(dead_code)]
    pub finish_reason: Option<String>,
}

/// Google API error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl std::fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.status, self.code) {
            (Some(status), _) => write!(f, "{}: {}", status, self.message),
            (None, Some(code)) => write!(f, "{}: {}", code, self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_shape_with_thinking() {
        let request = GenerateContentRequest::from_prompt("hi").with_thinking(true, 1024);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
                "generationConfig": {
                    "thinkingConfig": {"includeThoughts": true, "thinkingBudget": 1024}
                }
            })
        );
    }

    #[test]
    fn test_request_shape_without_thinking() {
        let json = serde_json::to_value(GenerateContentRequest::from_prompt("hi")).unwrap();
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_chunk_from_response_classifies_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [
                            {"text": "pondering", "thought": true},
                            {"text": "answer"},
                            {"functionCall": {"name": "f", "args": {}}}
                        ]
                    }
                }],
                "modelVersion": "gemini-2.5-flash"
            }"#,
        )
        .unwrap();

        let chunk = Chunk::from(response);
        assert_eq!(
            chunk.parts,
            vec![
                Part::thought("pondering"),
                Part::text("answer"),
                Part {
                    text: None,
                    is_thought: false
                },
            ]
        );
    }

    #[test]
    fn test_chunk_without_candidates_is_empty() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"usageMetadata": {"totalTokenCount": 3}}"#).unwrap();
        assert_eq!(Chunk::from(response), Chunk::default());
    }

    #[test]
    fn test_answer_text_skips_thoughts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [
                {"text": "hmm", "thought": true},
                {"text": "Hello"},
                {"text": ", world"}
            ]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.answer_text(), "Hello, world");
    }

    #[test]
    fn test_non_empty_text() {
        assert_eq!(Part::text("a").non_empty_text(), Some("a"));
        assert_eq!(Part::text("").non_empty_text(), None);
        assert_eq!(Part::default().non_empty_text(), None);
    }

    #[test]
    fn test_error_body_display() {
        let envelope: ApiErrorEnvelope = serde_json::from_str(
            r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#,
        )
        .unwrap();
        assert_eq!(
            envelope.error.to_string(),
            "INVALID_ARGUMENT: API key not valid"
        );
    }
}
