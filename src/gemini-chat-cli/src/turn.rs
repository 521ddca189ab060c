//! Turn accumulation and conversation history.

use gemini_chat_protocol::StreamEvent;
use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One immutable entry of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            thought: None,
        }
    }

    pub fn assistant(content: impl Into<String>, thought: Option<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            thought,
        }
    }
}

/// Whether a turn still accepts events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    Streaming,
    Finished,
}

/// The assistant side of one turn while it streams in.
///
/// Both buffers only grow. Once a terminal event has been applied, later
/// events are ignored.
#[derive(Debug, Default)]
pub struct Turn {
    thought: String,
    content: String,
    finished: bool,
}

impl Turn {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reasoning received so far.
    pub fn thought(&self) -> &str {
        &self.thought
    }

    /// Answer text received so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_empty(&self) -> bool {
        self.thought.is_empty() && self.content.is_empty()
    }

    /// Feed one decoded event into the turn.
    pub fn apply(&mut self, event: &StreamEvent) -> TurnStatus {
        if self.finished {
            return TurnStatus::Finished;
        }

        match event {
            StreamEvent::Thought(text) => self.thought.push_str(text),
            StreamEvent::Message(text) => self.content.push_str(text),
            StreamEvent::End(_) | StreamEvent::Error(_) => self.finished = true,
        }

        if self.finished {
            TurnStatus::Finished
        } else {
            TurnStatus::Streaming
        }
    }

    /// Close the turn, producing its record unless nothing arrived.
    pub fn finish(self) -> Option<ChatMessage> {
        if self.is_empty() {
            return None;
        }

        let thought = (!self.thought.is_empty()).then_some(self.thought);
        Some(ChatMessage::assistant(self.content, thought))
    }
}

/// Ordered chat history.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, prompt: impl Into<String>) {
        self.messages.push(ChatMessage::user(prompt));
    }

    /// Append the record of a finished turn, if it produced one.
    pub fn record(&mut self, message: Option<ChatMessage>) -> Option<&ChatMessage> {
        self.messages.push(message?);
        self.messages.last()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(events: &[StreamEvent]) -> Turn {
        let mut turn = Turn::new();
        for event in events {
            turn.apply(event);
        }
        turn
    }

    #[test]
    fn test_thoughts_and_answer_combine_into_one_record() {
        let turn = run(&[
            StreamEvent::Thought("x".into()),
            StreamEvent::Thought("y".into()),
            StreamEvent::Message("z".into()),
            StreamEvent::done(),
        ]);

        assert!(turn.is_finished());
        assert_eq!(
            turn.finish(),
            Some(ChatMessage::assistant("z", Some("xy".into())))
        );
    }

    #[test]
    fn test_answer_only_has_no_thought() {
        let turn = run(&[
            StreamEvent::Message("Hello".into()),
            StreamEvent::Message(" world".into()),
            StreamEvent::done(),
        ]);
        assert_eq!(turn.finish(), Some(ChatMessage::assistant("Hello world", None)));
    }

    #[test]
    fn test_error_finishes_with_partial_content() {
        let mut turn = Turn::new();
        assert_eq!(
            turn.apply(&StreamEvent::Message("partial".into())),
            TurnStatus::Streaming
        );
        assert_eq!(
            turn.apply(&StreamEvent::generation_failed()),
            TurnStatus::Finished
        );
        assert_eq!(turn.finish(), Some(ChatMessage::assistant("partial", None)));
    }

    #[test]
    fn test_empty_turn_produces_no_record() {
        let turn = run(&[StreamEvent::done()]);
        assert_eq!(turn.finish(), None);
    }

    #[test]
    fn test_events_after_terminal_are_ignored() {
        let mut turn = run(&[StreamEvent::Message("a".into()), StreamEvent::done()]);
        assert_eq!(
            turn.apply(&StreamEvent::Message("b".into())),
            TurnStatus::Finished
        );
        assert_eq!(turn.content(), "a");
    }

    #[test]
    fn test_conversation_records_turns_in_order() {
        let mut conversation = Conversation::new();
        conversation.push_user("Say hi");
        let recorded = conversation
            .record(Some(ChatMessage::assistant("Hi!", None)))
            .cloned();
        assert_eq!(recorded, Some(ChatMessage::assistant("Hi!", None)));

        conversation.push_user("Again");
        assert!(conversation.record(None).is_none());

        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);

        conversation.clear();
        assert!(conversation.is_empty());
    }

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_value(ChatMessage::assistant("z", Some("xy".into()))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"role": "assistant", "content": "z", "thought": "xy"})
        );

        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }
}
