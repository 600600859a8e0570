use crate::adapter::static_chunker::split_chars;
use crate::application::Chunking;
use crate::domain::{Chunk, Document, EmbeddingConfig};

/// Rough character budget per model token; good enough for sizing
/// windows, not for billing.
const CHARS_PER_TOKEN: usize = 4;

/// Chunker whose window is derived from the embedding model's maximum
/// sequence length, so chunks never overflow the model's input.
pub struct ModelAwareChunker {
    window: usize,
    overlap: usize,
}

impl ModelAwareChunker {
    pub fn for_model(config: &EmbeddingConfig) -> Self {
        let window = (config.max_sequence_length * CHARS_PER_TOKEN).max(1);
        Self {
            window,
            overlap: window / 10,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Chunking for ModelAwareChunker {
    fn split(&self, document: &Document) -> Vec<Chunk> {
        split_chars(document.content(), self.window, self.overlap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_tracks_model_limit() {
        let config = EmbeddingConfig::new("m".to_string(), 384, 512);
        let chunker = ModelAwareChunker::for_model(&config);
        assert_eq!(chunker.window(), 512 * CHARS_PER_TOKEN);
    }

    #[test]
    fn test_chunks_fit_the_model_window() {
        let config = EmbeddingConfig::new("m".to_string(), 384, 8);
        let chunker = ModelAwareChunker::for_model(&config);
        let doc = Document::new(1, "https://x".to_string(), "a".repeat(200));

        let chunks = chunker.split(&doc);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 32));
    }
}
