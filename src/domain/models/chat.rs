use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::connector::current_timestamp;
use super::embedding::ScoredDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    User,
    Assistant,
}

/// One turn in a chat session.
///
/// Immutable once sent, except the assistant message, which starts as a
/// placeholder and is updated in place when generation completes. The
/// parent back-reference is for lookup only, not ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    id: String,
    session_id: String,
    message_type: MessageType,
    parent_message_id: Option<String>,
    content: String,
    error: Option<String>,
    created_at: i64,
}

impl ChatMessage {
    pub fn user(session_id: String, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id,
            message_type: MessageType::User,
            parent_message_id: None,
            content,
            error: None,
            created_at: current_timestamp(),
        }
    }

    /// An empty assistant placeholder, persisted before generation starts
    /// so the client has something to poll.
    pub fn assistant_placeholder(session_id: String, parent_message_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id,
            message_type: MessageType::Assistant,
            parent_message_id: Some(parent_message_id),
            content: String::new(),
            error: None,
            created_at: current_timestamp(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn parent_message_id(&self) -> Option<&str> {
        self.parent_message_id.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    pub fn is_assistant(&self) -> bool {
        matches!(self.message_type, MessageType::Assistant)
    }
}

/// A session groups an ordered sequence of messages for one tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    id: String,
    tenant_id: String,
    created_at: i64,
}

impl ChatSession {
    pub fn new(tenant_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            created_at: current_timestamp(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }
}

/// One unit of the streamed chat response.
///
/// Events of one turn share a session but carry no cross-variant ordering
/// guarantee; producers emit in completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseEvent {
    Message(ChatMessage),
    Document(ScoredDocument),
    Error(ChatMessage),
}

impl ResponseEvent {
    pub fn is_error(&self) -> bool {
        matches!(self, ResponseEvent::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_links_to_parent() {
        let user = ChatMessage::user("s-1".to_string(), "hello".to_string());
        let assistant =
            ChatMessage::assistant_placeholder("s-1".to_string(), user.id().to_string());

        assert!(assistant.is_assistant());
        assert_eq!(assistant.parent_message_id(), Some(user.id()));
        assert!(assistant.content().is_empty());
        assert!(assistant.error().is_none());
    }

    #[test]
    fn test_set_error_preserves_content() {
        let mut msg = ChatMessage::assistant_placeholder("s-1".to_string(), "p-1".to_string());
        msg.set_content("partial answer");
        msg.set_error("model timed out");
        assert_eq!(msg.content(), "partial answer");
        assert_eq!(msg.error(), Some("model timed out"));
    }
}
