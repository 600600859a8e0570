use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::DocumentRepository;
use crate::domain::{Document, DomainError};

pub struct InMemoryDocumentRepository {
    documents: Mutex<HashMap<String, Document>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryDocumentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn save(&self, documents: &[Document]) -> Result<(), DomainError> {
        let mut store = self.documents.lock().await;
        for document in documents {
            store.insert(document.id().to_string(), document.clone());
        }
        debug!("Saved {} documents", documents.len());
        Ok(())
    }

    async fn find_by_connector(&self, connector_id: i64) -> Result<Vec<Document>, DomainError> {
        let store = self.documents.lock().await;
        let mut found: Vec<Document> = store
            .values()
            .filter(|d| d.connector_id() == connector_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(found)
    }

    async fn update_chunk_count(&self, document_id: &str, count: u64) -> Result<(), DomainError> {
        let mut store = self.documents.lock().await;
        let document = store
            .get_mut(document_id)
            .ok_or_else(|| DomainError::not_found(format!("document {}", document_id)))?;
        document.set_chunk_count(count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_find_by_connector() {
        let repo = InMemoryDocumentRepository::new();
        let docs = vec![
            Document::new(1, "https://a".to_string(), "a".to_string()),
            Document::new(2, "https://b".to_string(), "b".to_string()),
        ];
        repo.save(&docs).await.unwrap();

        let found = repo.find_by_connector(1).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source_link(), "https://a");
    }

    #[tokio::test]
    async fn test_update_chunk_count() {
        let repo = InMemoryDocumentRepository::new();
        let doc = Document::new(1, "https://a".to_string(), "a".to_string());
        repo.save(std::slice::from_ref(&doc)).await.unwrap();

        repo.update_chunk_count(doc.id(), 7).await.unwrap();

        let found = repo.find_by_connector(1).await.unwrap();
        assert_eq!(found[0].chunk_count(), 7);
    }
}
