//! Turns a question into an evidence context.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::config::DEFAULT_TOP_K;
use crate::document::RetrievalResult;
use crate::error::Result;
use crate::store::VectorStoreAdapter;

/// Ordered retrieval results rendered as the prompt's CONTEXT block.
///
/// Each result renders as `DOCUMENT (Score: 0.87):\n<content>\n\n`, in
/// retrieval order. No results render as the empty string.
#[derive(Debug, Clone, Default)]
pub struct EvidenceContext {
    results: Vec<RetrievalResult>,
}

impl EvidenceContext {
    /// Wrap results that are already in best-first order.
    pub fn new(results: Vec<RetrievalResult>) -> Self {
        Self { results }
    }

    /// `true` when no chunk was retrieved.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of chunks in the context.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// The underlying results.
    pub fn results(&self) -> &[RetrievalResult] {
        &self.results
    }

    /// Render the context string placed in the prompt.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EvidenceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            write!(f, "DOCUMENT (Score: {:.2}):\n{}\n\n", result.score, result.chunk.content)?;
        }
        Ok(())
    }
}

/// Queries the store and assembles the evidence for one question.
///
/// No score threshold is applied: every one of the top `k` results enters
/// the context, trading some noise for recall.
pub struct Retriever {
    store: Arc<VectorStoreAdapter>,
    top_k: usize,
}

impl Retriever {
    /// Create a retriever over `store` returning `DEFAULT_TOP_K` chunks.
    pub fn new(store: Arc<VectorStoreAdapter>) -> Self {
        Self { store, top_k: DEFAULT_TOP_K }
    }

    /// Set the number of chunks retrieved per question.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// The configured retrieval depth.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve with the configured depth.
    pub async fn retrieve(&self, question: &str) -> Result<EvidenceContext> {
        self.retrieve_k(question, self.top_k).await
    }

    /// Retrieve the `k` nearest chunks for `question`.
    pub async fn retrieve_k(&self, question: &str, k: usize) -> Result<EvidenceContext> {
        let results = self.store.similarity_search(question, k).await?;
        info!(k, result_count = results.len(), "retrieved evidence");
        Ok(EvidenceContext::new(results))
    }
}
