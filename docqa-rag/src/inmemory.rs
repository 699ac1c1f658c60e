//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] keeps collections in a `HashMap` behind a
//! `tokio::sync::RwLock`. It is meant for tests and local experiments.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{Chunk, RetrievalResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "InMemory";

/// An in-memory vector store using cosine similarity for search.
///
/// Collections are nested maps: collection name → chunk id → chunk.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, HashMap<String, Chunk>>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in `collection`, or `None` if it does not exist.
    pub async fn len(&self, collection: &str) -> Option<usize> {
        self.collections.read().await.get(collection).map(HashMap::len)
    }

    /// Return a stored chunk by id.
    pub async fn get(&self, collection: &str, id: &str) -> Option<Chunk> {
        self.collections.read().await.get(collection)?.get(id).cloned()
    }
}

fn missing(collection: &str) -> RagError {
    RagError::storage(BACKEND, format!("collection '{collection}' does not exist"))
}

/// Cosine similarity of two vectors; 0.0 if either has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, _dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn insert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        if let Some(existing) = chunks.iter().find(|c| store.contains_key(&c.id)) {
            return Err(RagError::storage(
                BACKEND,
                format!("id '{}' already exists in collection '{collection}'", existing.id),
            ));
        }
        for chunk in chunks {
            store.insert(chunk.id.clone(), chunk.clone());
        }
        debug!(collection, count = chunks.len(), "inserted chunks in memory");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        for chunk in chunks {
            store.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        for id in ids {
            store.remove(*id);
        }
        Ok(())
    }

    async fn clear(&self, collection: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.get_mut(collection).ok_or_else(|| missing(collection))?.clear();
        Ok(())
    }

    async fn replace(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        store.clear();
        for chunk in chunks {
            store.insert(chunk.id.clone(), chunk.clone());
        }
        debug!(collection, count = chunks.len(), "replaced collection contents in memory");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;

        let mut scored: Vec<RetrievalResult> = store
            .values()
            .map(|chunk| RetrievalResult {
                score: cosine_similarity(&chunk.embedding, embedding),
                chunk: Chunk { embedding: Vec::new(), ..chunk.clone() },
            })
            .collect();

        // Ties break on id so repeated searches are stable.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}
