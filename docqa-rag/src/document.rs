//! Data types for documents, chunks, and retrieval results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar metadata attached to documents and chunks.
pub type Metadata = BTreeMap<String, Value>;

/// Drop metadata entries whose value is null or an empty string.
pub fn prune_metadata(metadata: &Metadata) -> Metadata {
    metadata
        .iter()
        .filter(|(_, value)| match value {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Page-level text extracted from a source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The extracted text of the page.
    pub content: String,
    /// Key-value metadata describing where the text came from.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Create a document with no metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), metadata: Metadata::new() }
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A bounded segment of a [`Document`], the unit of storage and retrieval.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier (`doc-0`, `doc-1`, …). Empty until ingestion assigns one.
    pub id: String,
    /// The text content of the chunk.
    pub content: String,
    /// Metadata inherited from the parent document, with empty values pruned.
    pub metadata: Metadata,
    /// The vector embedding for this chunk's content.
    ///
    /// Empty until the chunk is embedded. Search results do not carry it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

/// A retrieved [`Chunk`] paired with its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is closer).
    pub score: f32,
}
