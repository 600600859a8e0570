use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::EmbeddingService;
use crate::domain::{DomainError, EmbeddingConfig};

#[derive(Serialize)]
struct EmbeddingRequestBody<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponseBody {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

/// Embedding backend speaking the OpenAI-compatible `/v1/embeddings`
/// protocol. The response is re-ordered by the returned `index` field so
/// output vectors always line up with input texts.
pub struct HttpEmbedding {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    config: EmbeddingConfig,
}

impl HttpEmbedding {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, config: EmbeddingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            config,
        }
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let body = EmbeddingRequestBody {
            model: &self.config.model_name,
            input: texts,
        };

        let mut request = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DomainError::embedding(format!("embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DomainError::embedding(format!(
                "embedding backend returned {}",
                response.status()
            )));
        }

        let parsed: EmbeddingResponseBody = response
            .json()
            .await
            .map_err(|e| DomainError::embedding(format!("malformed embedding response: {}", e)))?;

        let mut vectors: Vec<Vec<f32>> = vec![Vec::new(); texts.len()];
        for datum in parsed.data {
            if datum.index >= vectors.len() {
                return Err(DomainError::embedding(format!(
                    "embedding response index {} out of range",
                    datum.index
                )));
            }
            vectors[datum.index] = datum.embedding;
        }
        if vectors.iter().any(|v| v.is_empty()) {
            return Err(DomainError::embedding("embedding response missing vectors"));
        }

        debug!("Embedded {} texts via {}", texts.len(), self.base_url);
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingService for HttpEmbedding {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        let mut vectors = self.request(&[query.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| DomainError::embedding("embedding backend returned no vector"))
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}
