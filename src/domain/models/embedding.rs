use serde::{Deserialize, Serialize};

/// A bounded slice of a document's content, sized for embedding.
///
/// The index ties a vector back to the source text it was computed from,
/// so it must survive the round trip through the embedding backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

impl Chunk {
    pub fn new(index: usize, text: String) -> Self {
        Self { index, text }
    }
}

/// Configuration for the embedding model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model_name: String,
    pub dimensions: usize,
    pub max_sequence_length: usize,
}

impl EmbeddingConfig {
    pub fn new(model_name: String, dimensions: usize, max_sequence_length: usize) -> Self {
        Self {
            model_name,
            dimensions,
            max_sequence_length,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: "mock-embedding".to_string(),
            dimensions: 384,
            max_sequence_length: 512,
        }
    }
}

/// Outcome of one embedding-pipeline run over a batch of documents.
///
/// Chunk failures are partial by design: vectors that did come back are
/// persisted and only the failed indices are reported.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingReport {
    embedded: Vec<(String, usize)>,
    failed: Vec<ChunkFailure>,
}

#[derive(Debug, Clone)]
pub struct ChunkFailure {
    pub document_id: String,
    pub chunk_index: usize,
    pub message: String,
}

impl EmbeddingReport {
    pub fn record_embedded(&mut self, document_id: &str, chunk_index: usize) {
        self.embedded.push((document_id.to_string(), chunk_index));
    }

    pub fn record_failure(
        &mut self,
        document_id: &str,
        chunk_index: usize,
        message: impl Into<String>,
    ) {
        self.failed.push(ChunkFailure {
            document_id: document_id.to_string(),
            chunk_index,
            message: message.into(),
        });
    }

    pub fn embedded(&self) -> &[(String, usize)] {
        &self.embedded
    }

    pub fn failed(&self) -> &[ChunkFailure] {
        &self.failed
    }

    pub fn embedded_count(&self) -> usize {
        self.embedded.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty() && !self.embedded.is_empty()
    }
}

/// One vector-search hit: a chunk of a stored document with its score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document_id: String,
    pub chunk_index: usize,
    pub content: String,
    pub score: f32,
    pub collection: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_partial_and_complete() {
        let mut report = EmbeddingReport::default();
        assert!(report.is_complete());
        assert!(!report.is_partial());

        report.record_embedded("doc-1", 0);
        report.record_failure("doc-1", 1, "backend refused");
        assert!(!report.is_complete());
        assert!(report.is_partial());
        assert_eq!(report.embedded_count(), 1);
        assert_eq!(report.failed()[0].chunk_index, 1);
    }
}
