use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::VectorRepository;
use crate::domain::{DomainError, ScoredDocument};

#[derive(Clone)]
struct StoredVector {
    vector: Vec<f32>,
    text: String,
}

/// Collection -> (document_id, chunk_index) -> vector. Upserts overwrite
/// by key, so retried writes are idempotent.
pub struct InMemoryVectorRepository {
    collections: Mutex<HashMap<String, HashMap<(String, usize), StoredVector>>>,
}

impl InMemoryVectorRepository {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryVectorRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorRepository for InMemoryVectorRepository {
    async fn upsert(
        &self,
        collection: &str,
        document_id: &str,
        chunk_index: usize,
        vector: &[f32],
        text: &str,
    ) -> Result<(), DomainError> {
        let mut collections = self.collections.lock().await;
        collections.entry(collection.to_string()).or_default().insert(
            (document_id.to_string(), chunk_index),
            StoredVector {
                vector: vector.to_vec(),
                text: text.to_string(),
            },
        );
        debug!(
            collection,
            document_id, chunk_index, "Upserted vector ({} dims)",
            vector.len()
        );
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredDocument>, DomainError> {
        let collections = self.collections.lock().await;
        let store = match collections.get(collection) {
            Some(store) => store,
            None => return Ok(Vec::new()),
        };

        let mut scored: Vec<ScoredDocument> = store
            .iter()
            .map(|((document_id, chunk_index), stored)| ScoredDocument {
                document_id: document_id.clone(),
                chunk_index: *chunk_index,
                content: stored.text.clone(),
                score: cosine_similarity(query_vector, &stored.vector),
                collection: collection.to_string(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count(&self, collection: &str) -> Result<u64, DomainError> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .map(|store| store.len() as u64)
            .unwrap_or(0))
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_overwrites_by_key() {
        let repo = InMemoryVectorRepository::new();
        repo.upsert("c", "doc", 0, &[1.0, 0.0], "old").await.unwrap();
        repo.upsert("c", "doc", 0, &[0.0, 1.0], "new").await.unwrap();

        assert_eq!(repo.count("c").await.unwrap(), 1);
        let hits = repo.search("c", &[0.0, 1.0], 10).await.unwrap();
        assert_eq!(hits[0].content, "new");
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let repo = InMemoryVectorRepository::new();
        repo.upsert("c", "doc", 0, &[1.0, 0.0], "x-axis").await.unwrap();
        repo.upsert("c", "doc", 1, &[0.0, 1.0], "y-axis").await.unwrap();

        let hits = repo.search("c", &[0.9, 0.1], 2).await.unwrap();
        assert_eq!(hits[0].content, "x-axis");
        assert_eq!(hits[1].content, "y-axis");
    }

    #[tokio::test]
    async fn test_unknown_collection_is_empty() {
        let repo = InMemoryVectorRepository::new();
        let hits = repo.search("missing", &[1.0], 5).await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(repo.count("missing").await.unwrap(), 0);
    }
}
