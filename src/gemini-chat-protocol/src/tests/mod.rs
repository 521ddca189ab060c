//! Tests for gemini-chat-protocol
