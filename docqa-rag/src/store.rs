//! The vector store adapter: embedding plus persistence for one collection.
//!
//! [`VectorStoreAdapter`] is what the rest of the pipeline talks to. It owns
//! the mapping from text to vectors (via an [`EmbeddingProvider`]) and writes
//! and searches through a [`VectorStore`] backend.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::document::{Chunk, RetrievalResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::{ConflictPolicy, VectorStore};

/// Generate sequential chunk ids: `doc-0`, `doc-1`, …
pub fn sequential_ids(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("doc-{i}")).collect()
}

/// Embeds and stores chunks in one named collection and searches it.
pub struct VectorStoreAdapter {
    embeddings: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    collection: String,
    conflict_policy: ConflictPolicy,
}

impl VectorStoreAdapter {
    /// Create an adapter for `collection`.
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embeddings,
            store,
            collection: collection.into(),
            conflict_policy: ConflictPolicy::default(),
        }
    }

    /// Set what [`add`](Self::add) does when ids already exist.
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// The collection this adapter reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The active conflict policy.
    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.conflict_policy
    }

    /// Create the backing collection sized for the embedding provider.
    pub async fn ensure_collection(&self) -> Result<()> {
        self.store.create_collection(&self.collection, self.embeddings.dimensions()).await
    }

    /// Embed `chunks`, assign `ids`, and persist them.
    ///
    /// Returns the stored chunks with ids and embeddings attached.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidInput`] if lengths differ or ids repeat.
    /// - [`RagError::Embedding`] if the provider fails.
    /// - [`RagError::Storage`] if the backend rejects the write, including an
    ///   id collision under [`ConflictPolicy::Fail`].
    pub async fn add(&self, chunks: &[Chunk], ids: &[String]) -> Result<Vec<Chunk>> {
        if chunks.len() != ids.len() {
            return Err(RagError::InvalidInput(format!(
                "{} chunks but {} ids",
                chunks.len(),
                ids.len()
            )));
        }
        let mut seen = HashSet::with_capacity(ids.len());
        if let Some(dup) = ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(RagError::InvalidInput(format!("duplicate id '{dup}'")));
        }
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let vectors = self.embeddings.embed_batch(&texts).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "embedding failed during ingestion");
            e
        })?;
        if vectors.len() != chunks.len() {
            return Err(RagError::Embedding {
                provider: "adapter".into(),
                message: format!("expected {} embeddings, got {}", chunks.len(), vectors.len()),
            });
        }

        let stored: Vec<Chunk> = chunks
            .iter()
            .zip(ids)
            .zip(vectors)
            .map(|((chunk, id), embedding)| Chunk {
                id: id.clone(),
                content: chunk.content.clone(),
                metadata: chunk.metadata.clone(),
                embedding,
            })
            .collect();

        let written = match self.conflict_policy {
            ConflictPolicy::Replace => self.store.replace(&self.collection, &stored).await,
            ConflictPolicy::Overwrite => self.store.upsert(&self.collection, &stored).await,
            ConflictPolicy::Fail => self.store.insert(&self.collection, &stored).await,
        };
        written.map_err(|e| {
            error!(
                collection = %self.collection,
                policy = %self.conflict_policy,
                error = %e,
                "store write failed"
            );
            e
        })?;

        info!(
            collection = %self.collection,
            count = stored.len(),
            policy = %self.conflict_policy,
            "stored chunks"
        );
        Ok(stored)
    }

    /// Return at most `k` chunks most similar to `query`, best match first.
    ///
    /// The query is embedded once. Scores are cosine similarities.
    pub async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let embedding = self.embeddings.embed(query).await.map_err(|e| {
            error!(error = %e, "query embedding failed");
            e
        })?;

        let mut results = self.store.search(&self.collection, &embedding, k).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "vector store search failed");
            e
        })?;
        results.truncate(k);

        debug!(collection = %self.collection, k, result_count = results.len(), "similarity search");
        Ok(results)
    }
}
