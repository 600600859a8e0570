use async_trait::async_trait;

use crate::domain::DomainError;

/// An interface for sending prompts to a language model and receiving
/// text responses.
///
/// Implementors encapsulate transport, serialization, and vendor-specific
/// API details. Consumers remain decoupled from any particular provider
/// or HTTP client library.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, DomainError>;
}
