use async_trait::async_trait;

use crate::domain::{Document, DomainError};

/// Persistence contract for fetched documents.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn save(&self, documents: &[Document]) -> Result<(), DomainError>;

    async fn find_by_connector(&self, connector_id: i64) -> Result<Vec<Document>, DomainError>;

    async fn update_chunk_count(&self, document_id: &str, count: u64) -> Result<(), DomainError>;
}
