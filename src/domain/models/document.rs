use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::connector::current_timestamp;

/// A unit of fetched content, owned by the connector that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    id: String,
    connector_id: i64,
    source_link: String,
    content: String,
    fetched_at: i64,
    chunk_count: u64,
}

impl Document {
    pub fn new(connector_id: i64, source_link: String, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            connector_id,
            source_link,
            content,
            fetched_at: current_timestamp(),
            chunk_count: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn connector_id(&self) -> i64 {
        self.connector_id
    }

    pub fn source_link(&self) -> &str {
        &self.source_link
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn fetched_at(&self) -> i64 {
        self.fetched_at
    }

    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    pub fn set_chunk_count(&mut self, count: u64) {
        self.chunk_count = count;
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let doc = Document::new(3, "https://example.com".to_string(), "hello".to_string());
        assert_eq!(doc.connector_id(), 3);
        assert_eq!(doc.source_link(), "https://example.com");
        assert_eq!(doc.chunk_count(), 0);
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_blank_content_is_empty() {
        let doc = Document::new(3, "https://example.com".to_string(), "  \n ".to_string());
        assert!(doc.is_empty());
    }
}
