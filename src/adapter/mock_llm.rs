use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::LlmClient;
use crate::domain::DomainError;

/// Canned language model for tests and offline runs.
pub struct MockLlm {
    reply: String,
    fail_with: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockLlm {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            fail_with: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: String::new(),
            fail_with: Some(message.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts seen so far, for assertions.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn generate(&self, prompt: &str) -> Result<String, DomainError> {
        self.prompts.lock().await.push(prompt.to_string());
        match &self.fail_with {
            Some(message) => Err(DomainError::generation(message.clone())),
            None => Ok(self.reply.clone()),
        }
    }
}
