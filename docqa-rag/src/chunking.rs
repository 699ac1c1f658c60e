//! Recursive character text splitting.
//!
//! [`RecursiveChunker`] splits text on a priority list of separators
//! (paragraph break, line break, sentence ends, space, then single
//! characters), merges the pieces back into chunks of at most `chunk_size`
//! characters, and carries up to `chunk_overlap` trailing characters of each
//! chunk into the next one.
//!
//! Sizes are counted in characters (Unicode scalar values), so multi-byte
//! text is never cut inside a code point.

use crate::config::RagConfig;
use crate::document::{Chunk, Document, prune_metadata};

/// Default maximum chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 150;

/// Separators tried in order. The empty separator splits into characters.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " ", ""];

/// Splits text hierarchically and merges the pieces with overlap.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 150);
/// let chunks = chunker.split_documents(&pages);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// Sizes are expected to be validated by [`RagConfig`](crate::RagConfig);
    /// a zero `chunk_size` is clamped to one and the overlap to `chunk_size - 1`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }

    /// Build a chunker with the sizes from `config`.
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Maximum chunk size in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap between consecutive chunks in characters.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split raw text into chunk strings. Empty input yields no chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        self.split_recursive(text, SEPARATORS)
    }

    /// Split each document and return its chunks in document order.
    ///
    /// Chunks inherit the parent document's metadata with empty values
    /// pruned. Ids are left empty; ingestion assigns them.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for document in documents {
            let metadata = prune_metadata(&document.metadata);
            chunks.extend(self.split_text(&document.content).into_iter().map(|content| Chunk {
                id: String::new(),
                content,
                metadata: metadata.clone(),
                embedding: Vec::new(),
            }));
        }
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // Pick the first separator that occurs in the text.
        let mut separator = "";
        let mut remaining: &[&str] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                break;
            }
            if text.contains(candidate) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut good_splits: Vec<&str> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                good_splits.push(piece);
                continue;
            }
            if !good_splits.is_empty() {
                chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }
            if remaining.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            chunks.extend(self.merge_splits(&good_splits));
        }

        chunks
    }

    /// Greedily join pieces up to `chunk_size`, keeping a tail of at most
    /// `chunk_overlap` characters as the start of the next chunk.
    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: Vec<&str> = Vec::new();
        let mut window_len = 0usize;
        let mut start = 0usize;

        for piece in splits {
            let len = char_len(piece);
            if window_len + len > self.chunk_size && !window[start..].is_empty() {
                push_trimmed(&mut chunks, &window[start..]);

                while window_len > self.chunk_overlap
                    || (window_len + len > self.chunk_size && window_len > 0)
                {
                    window_len -= char_len(window[start]);
                    start += 1;
                }
            }
            window.push(piece);
            window_len += len;
        }

        push_trimmed(&mut chunks, &window[start..]);
        chunks
    }
}

fn push_trimmed(chunks: &mut Vec<String>, pieces: &[&str]) {
    let joined = pieces.concat();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split at `separator`, attaching each separator to the start of the piece
/// that follows it. The empty separator splits into single characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text.char_indices().map(|(i, c)| &text[i..i + c.len_utf8()]).collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (pos, _) in text.match_indices(separator) {
        if pos > start {
            pieces.push(&text[start..pos]);
        }
        start = pos;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}
