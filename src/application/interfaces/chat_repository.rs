use async_trait::async_trait;

use crate::domain::{ChatMessage, ChatSession, DomainError};

/// Persistence contract for chat sessions and their messages.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn save_session(&self, session: &ChatSession) -> Result<(), DomainError>;

    async fn save_message(&self, message: &ChatMessage) -> Result<(), DomainError>;

    /// Replace the stored message with the same id (assistant messages are
    /// updated in place as generation completes).
    async fn update_message(&self, message: &ChatMessage) -> Result<(), DomainError>;

    /// Messages of one session in creation order.
    async fn session_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, DomainError>;
}
