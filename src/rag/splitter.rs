//! Fixed-size character chunking with overlap.
//!
//! Overlap exists so answers spanning a chunk boundary are still retrievable
//! from at least one chunk.

/// A chunk of extracted text before embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub text: String,
    /// Origin file name.
    pub source: String,
    /// 1-based page number within the source document.
    pub page: i64,
}

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        // A step of zero would loop forever; clamp overlap below chunk size.
        let chunk_size = chunk_size.max(1);
        let chunk_overlap = chunk_overlap.min(chunk_size - 1);
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Split `text` into chunks of `chunk_size` characters where consecutive
    /// chunks share exactly `chunk_overlap` characters. The final chunk may
    /// be shorter.
    pub fn split(&self, text: &str, source: &str, page: i64) -> Vec<TextChunk> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        if total == 0 {
            return Vec::new();
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let end = (start + self.chunk_size).min(total);
            chunks.push(TextChunk {
                text: chars[start..end].iter().collect(),
                source: source.to_string(),
                page,
            });
            if end == total {
                break;
            }
            start += step;
        }

        chunks
    }
}
