use async_trait::async_trait;
use rand::Rng;
use rand::SeedableRng;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

use crate::application::EmbeddingService;
use crate::domain::{DomainError, EmbeddingConfig};

/// Deterministic hash-seeded embeddings; identical text always maps to
/// the same normalized vector, so similarity is stable across runs.
pub struct MockEmbedding {
    config: EmbeddingConfig,
    /// Texts containing this marker fail to embed (failure-path testing).
    poison_marker: Option<String>,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self {
            config: EmbeddingConfig::new("mock-embedding".to_string(), 384, 512),
            poison_marker: None,
        }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            config: EmbeddingConfig::new("mock-embedding".to_string(), dimensions, 512),
            poison_marker: None,
        }
    }

    pub fn with_poison_marker(mut self, marker: impl Into<String>) -> Self {
        self.poison_marker = Some(marker.into());
        self
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();

        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut vector: Vec<f32> = (0..self.config.dimensions)
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for x in &mut vector {
                *x /= magnitude;
            }
        }

        vector
    }

    fn check_poison(&self, text: &str) -> Result<(), DomainError> {
        if let Some(marker) = &self.poison_marker {
            if text.contains(marker.as_str()) {
                return Err(DomainError::embedding(format!(
                    "mock backend refuses text containing '{}'",
                    marker
                )));
            }
        }
        Ok(())
    }
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingService for MockEmbedding {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            self.check_poison(text)?;
            vectors.push(self.generate_embedding(text));
        }

        debug!("Generated {} mock embeddings", vectors.len());
        Ok(vectors)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        self.check_poison(query)?;
        Ok(self.generate_embedding(query))
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedding_consistency() {
        let service = MockEmbedding::new();

        let embedding1 = service.embed_query("hello world").await.unwrap();
        let embedding2 = service.embed_query("hello world").await.unwrap();

        assert_eq!(embedding1, embedding2);
    }

    #[tokio::test]
    async fn test_mock_embedding_dimensions() {
        let service = MockEmbedding::with_dimensions(128);

        let embedding = service.embed_query("test").await.unwrap();

        assert_eq!(embedding.len(), 128);
    }

    #[tokio::test]
    async fn test_mock_embedding_normalized() {
        let service = MockEmbedding::new();

        let embedding = service.embed_query("test").await.unwrap();
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();

        assert!((magnitude - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_poison_marker_fails_batch() {
        let service = MockEmbedding::new().with_poison_marker("BAD");

        let texts = vec!["fine".to_string(), "this is BAD".to_string()];
        assert!(service.embed(&texts).await.is_err());

        let clean = vec!["fine".to_string()];
        assert_eq!(service.embed(&clean).await.unwrap().len(), 1);
    }
}
