//! Vector store trait for storing and searching chunk embeddings.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, RetrievalResult};
use crate::error::{RagError, Result};

/// A storage backend for chunk embeddings with similarity search.
///
/// Scores returned by [`search`](VectorStore::search) are cosine
/// similarities: higher means closer, and results come back in descending
/// score order. Every backend must follow this convention.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection. No-op if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection and all its records. No-op if absent.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Insert chunks. Fails without writing anything if an id already exists.
    async fn insert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Insert chunks, overwriting records that share an id.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Delete chunks by their ids.
    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()>;

    /// Remove every record from a collection, keeping the collection.
    async fn clear(&self, collection: &str) -> Result<()>;

    /// Replace the collection's contents with `chunks`.
    ///
    /// The default clears then inserts; backends with transactions should
    /// override it so a failed insert leaves the old records in place.
    async fn replace(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        self.clear(collection).await?;
        self.insert(collection, chunks).await
    }

    /// Return at most `top_k` chunks closest to `embedding`, best first.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>>;
}

/// What ingestion does when chunk ids already exist in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Clear the collection, then insert. Re-ingesting a document leaves
    /// exactly its current chunks behind.
    #[default]
    Replace,
    /// Upsert by id; records with ids beyond the new chunk count survive.
    Overwrite,
    /// Reject the whole write with a storage error on any collision.
    Fail,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictPolicy::Replace => "replace",
            ConflictPolicy::Overwrite => "overwrite",
            ConflictPolicy::Fail => "fail",
        })
    }
}

impl FromStr for ConflictPolicy {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(ConflictPolicy::Replace),
            "overwrite" | "upsert" => Ok(ConflictPolicy::Overwrite),
            "fail" | "error" => Ok(ConflictPolicy::Fail),
            other => Err(RagError::Config(format!(
                "unknown conflict policy '{other}' (expected replace, overwrite or fail)"
            ))),
        }
    }
}
