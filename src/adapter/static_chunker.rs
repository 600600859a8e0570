use crate::application::Chunking;
use crate::domain::{Chunk, Document};

/// Fixed-size sliding-window chunker over characters, with overlap so a
/// sentence cut at a window boundary still appears whole in one chunk.
pub struct StaticChunker {
    window: usize,
    overlap: usize,
}

impl StaticChunker {
    pub fn new(window: usize, overlap: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            // An overlap >= window would never advance.
            overlap: overlap.min(window - 1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Default for StaticChunker {
    fn default() -> Self {
        Self::new(1000, 100)
    }
}

impl Chunking for StaticChunker {
    fn split(&self, document: &Document) -> Vec<Chunk> {
        split_chars(document.content(), self.window, self.overlap)
    }
}

pub(crate) fn split_chars(content: &str, window: usize, overlap: usize) -> Vec<Chunk> {
    let chars: Vec<char> = content.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let step = window - overlap;
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;

    while start < chars.len() {
        let end = (start + window).min(chars.len());
        let text: String = chars[start..end].iter().collect();
        if !text.trim().is_empty() {
            chunks.push(Chunk::new(index, text));
            index += 1;
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> Document {
        Document::new(1, "https://example.com".to_string(), content.to_string())
    }

    #[test]
    fn test_short_content_is_one_chunk() {
        let chunker = StaticChunker::new(100, 10);
        let chunks = chunker.split(&doc("short text"));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, "short text");
    }

    #[test]
    fn test_windows_overlap() {
        let chunker = StaticChunker::new(10, 4);
        let chunks = chunker.split(&doc("abcdefghijklmnop"));
        assert!(chunks.len() >= 2);
        // Tail of one window reappears at the head of the next.
        assert!(chunks[1].text.starts_with(&chunks[0].text[6..]));
    }

    #[test]
    fn test_indices_are_sequential() {
        let chunker = StaticChunker::new(5, 0);
        let chunks = chunker.split(&doc("aaaaabbbbbccccc"));
        let indices: Vec<usize> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_content_yields_no_chunks() {
        let chunker = StaticChunker::default();
        assert!(chunker.split(&doc("")).is_empty());
    }

    #[test]
    fn test_multibyte_content_splits_cleanly() {
        let chunker = StaticChunker::new(4, 1);
        let chunks = chunker.split(&doc("héllö wörld"));
        assert!(!chunks.is_empty());
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert!(joined.contains("héll"));
    }
}
