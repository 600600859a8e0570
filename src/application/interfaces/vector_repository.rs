use async_trait::async_trait;

use crate::domain::{DomainError, ScoredDocument};

/// Vector storage and similarity search operations.
///
/// Upserts are keyed by `(document_id, chunk_index)`; retries overwrite
/// the same key, so last-writer-wins is safe.
#[async_trait]
pub trait VectorRepository: Send + Sync {
    async fn upsert(
        &self,
        collection: &str,
        document_id: &str,
        chunk_index: usize,
        vector: &[f32],
        text: &str,
    ) -> Result<(), DomainError>;

    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredDocument>, DomainError>;

    async fn count(&self, collection: &str) -> Result<u64, DomainError>;
}
