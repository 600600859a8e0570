use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::{Chunking, DocumentRepository, EmbeddingService, VectorRepository};
use crate::domain::{Chunk, Document, DomainError, EmbeddingReport};

/// Turns fetched documents into vectors in the store.
///
/// Chunk failures are isolated: a failed batch is retried chunk by chunk
/// and every vector that does come back is persisted immediately, keyed
/// by `(document_id, chunk_index)`. The report lists exactly which chunks
/// made it and which did not.
pub struct EmbedDocumentsUseCase {
    chunking: Arc<dyn Chunking>,
    embedding_service: Arc<dyn EmbeddingService>,
    vector_repo: Arc<dyn VectorRepository>,
    document_repo: Arc<dyn DocumentRepository>,
    batch_size: usize,
}

impl EmbedDocumentsUseCase {
    pub fn new(
        chunking: Arc<dyn Chunking>,
        embedding_service: Arc<dyn EmbeddingService>,
        vector_repo: Arc<dyn VectorRepository>,
        document_repo: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self {
            chunking,
            embedding_service,
            vector_repo,
            document_repo,
            batch_size: 16,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub async fn execute(
        &self,
        collection: &str,
        documents: &[Document],
    ) -> Result<EmbeddingReport, DomainError> {
        let mut report = EmbeddingReport::default();

        for document in documents {
            if document.is_empty() {
                debug!(document_id = document.id(), "Skipping empty document");
                continue;
            }

            let chunks = self.chunking.split(document);
            if chunks.is_empty() {
                continue;
            }

            let mut embedded_for_doc = 0u64;
            for batch in chunks.chunks(self.batch_size) {
                embedded_for_doc += self
                    .embed_batch(collection, document, batch, &mut report)
                    .await;
            }

            if embedded_for_doc > 0 {
                self.document_repo
                    .update_chunk_count(document.id(), chunks.len() as u64)
                    .await?;
            }
        }

        if report.is_partial() {
            warn!(
                "Embedding finished partially: {} chunks stored, {} failed",
                report.embedded_count(),
                report.failed().len()
            );
        } else {
            info!("Embedded {} chunks into '{}'", report.embedded_count(), collection);
        }
        Ok(report)
    }

    /// Embed one batch; on a batch-level failure fall back to embedding
    /// chunks individually so one poisoned chunk cannot sink its batch.
    async fn embed_batch(
        &self,
        collection: &str,
        document: &Document,
        batch: &[Chunk],
        report: &mut EmbeddingReport,
    ) -> u64 {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();

        match self.embedding_service.embed(&texts).await {
            Ok(vectors) if vectors.len() == batch.len() => {
                let mut stored = 0u64;
                for (chunk, vector) in batch.iter().zip(vectors.iter()) {
                    stored += self
                        .store_chunk(collection, document, chunk, vector, report)
                        .await;
                }
                stored
            }
            Ok(vectors) => {
                warn!(
                    document_id = document.id(),
                    "Embedding backend returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                );
                for chunk in batch {
                    report.record_failure(document.id(), chunk.index, "vector count mismatch");
                }
                0
            }
            Err(batch_err) => {
                debug!(
                    document_id = document.id(),
                    "Batch embedding failed ({}), retrying chunks individually", batch_err
                );
                let mut stored = 0u64;
                for chunk in batch {
                    match self.embedding_service.embed(&[chunk.text.clone()]).await {
                        Ok(vectors) if vectors.len() == 1 => {
                            stored += self
                                .store_chunk(collection, document, chunk, &vectors[0], report)
                                .await;
                        }
                        Ok(_) => {
                            report.record_failure(
                                document.id(),
                                chunk.index,
                                "vector count mismatch",
                            );
                        }
                        Err(e) => {
                            report.record_failure(document.id(), chunk.index, e.to_string());
                        }
                    }
                }
                stored
            }
        }
    }

    async fn store_chunk(
        &self,
        collection: &str,
        document: &Document,
        chunk: &Chunk,
        vector: &[f32],
        report: &mut EmbeddingReport,
    ) -> u64 {
        match self
            .vector_repo
            .upsert(collection, document.id(), chunk.index, vector, &chunk.text)
            .await
        {
            Ok(()) => {
                report.record_embedded(document.id(), chunk.index);
                1
            }
            Err(e) => {
                warn!(
                    document_id = document.id(),
                    chunk_index = chunk.index,
                    "Failed to store vector: {}",
                    e
                );
                report.record_failure(document.id(), chunk.index, e.to_string());
                0
            }
        }
    }
}
