use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::ChatRepository;
use crate::domain::{ChatMessage, ChatSession, DomainError};

pub struct InMemoryChatRepository {
    sessions: Mutex<HashMap<String, ChatSession>>,
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            messages: Mutex::new(Vec::new()),
        }
    }
}

impl Default for InMemoryChatRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn save_session(&self, session: &ChatSession) -> Result<(), DomainError> {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(session.id().to_string(), session.clone());
        Ok(())
    }

    async fn save_message(&self, message: &ChatMessage) -> Result<(), DomainError> {
        let mut messages = self.messages.lock().await;
        messages.push(message.clone());
        Ok(())
    }

    async fn update_message(&self, message: &ChatMessage) -> Result<(), DomainError> {
        let mut messages = self.messages.lock().await;
        let stored = messages
            .iter_mut()
            .find(|m| m.id() == message.id())
            .ok_or_else(|| DomainError::not_found(format!("message {}", message.id())))?;
        *stored = message.clone();
        Ok(())
    }

    async fn session_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, DomainError> {
        let messages = self.messages.lock().await;
        Ok(messages
            .iter()
            .filter(|m| m.session_id() == session_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let repo = InMemoryChatRepository::new();
        let mut msg = ChatMessage::assistant_placeholder("s-1".to_string(), "p-1".to_string());
        repo.save_message(&msg).await.unwrap();

        msg.set_content("final answer");
        repo.update_message(&msg).await.unwrap();

        let stored = repo.session_messages("s-1").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].content(), "final answer");
    }

    #[tokio::test]
    async fn test_session_messages_preserve_order() {
        let repo = InMemoryChatRepository::new();
        let first = ChatMessage::user("s-1".to_string(), "first".to_string());
        let second = ChatMessage::user("s-1".to_string(), "second".to_string());
        let other = ChatMessage::user("s-2".to_string(), "elsewhere".to_string());
        for m in [&first, &second, &other] {
            repo.save_message(m).await.unwrap();
        }

        let stored = repo.session_messages("s-1").await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].content(), "first");
        assert_eq!(stored[1].content(), "second");
    }
}
