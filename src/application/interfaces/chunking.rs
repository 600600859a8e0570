use crate::domain::{Chunk, Document};

/// Splits a document's content into chunks sized for embedding.
///
/// Strategies are pluggable: fixed-size windows or windows derived from
/// the embedding model's limits. Chunk indices are assigned in content
/// order starting at zero.
pub trait Chunking: Send + Sync {
    fn split(&self, document: &Document) -> Vec<Chunk>;
}
