//! Request bodies of the HTTP API.

use serde::Deserialize;

use crate::agent_loop::TurnRequest;
use crate::types::{Message, Role};

/// Body of `POST /api/chat/stream`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatStreamRequest {
    #[serde(default)]
    pub messages: Vec<WireMessage>,
    #[serde(default)]
    pub new_message: String,
    #[serde(default)]
    pub chat_id: String,
}

/// A prior message as the client holds it.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl From<ChatStreamRequest> for TurnRequest {
    fn from(body: ChatStreamRequest) -> Self {
        let history = body
            .messages
            .into_iter()
            .filter(|m| matches!(m.role, Role::User | Role::Assistant))
            .map(|m| match m.role {
                Role::User => Message::user(m.content),
                _ => Message::assistant(m.content),
            })
            .collect();
        TurnRequest::new(body.chat_id, body.new_message).with_history(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_body_becomes_turn_request() {
        let body: ChatStreamRequest = serde_json::from_value(serde_json::json!({
            "messages": [
                { "role": "user", "content": "hi" },
                { "role": "assistant", "content": "hello" },
                { "role": "system", "content": "ignored" }
            ],
            "newMessage": "what is the moon?",
            "chatId": "chat-1"
        }))
        .unwrap();

        let request = TurnRequest::from(body);
        assert_eq!(request.thread_id, "chat-1");
        assert_eq!(request.new_message, "what is the moon?");
        assert_eq!(request.history.len(), 2);
        assert_eq!(request.history[1].role, Role::Assistant);
    }
}
