//! Deterministic stand-ins for the embedding and chat providers.
//!
//! Useful for tests and offline demos: no network, no API keys, stable output.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::hash::fnv1a;
use crate::model::{ChatModel, ChatRequest};

/// Bag-of-words embeddings via feature hashing.
///
/// Each lowercased alphanumeric token increments one of `dimensions` buckets
/// chosen by an FNV-1a hash, and the vector is L2-normalised. Texts sharing
/// words therefore land close together under cosine similarity.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimensions: usize,
}

impl HashingEmbeddingProvider {
    /// Create a provider producing vectors of length `dimensions` (at least 1).
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }

    fn bucket(&self, token: &str) -> usize {
        (fnv1a(token.as_bytes()) % self.dimensions as u64) as usize
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            vector[self.bucket(token)] += 1.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

type Responder = dyn Fn(&ChatRequest) -> Result<String> + Send + Sync;

/// A [`ChatModel`] whose replies come from a closure. Every request is recorded.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::mock::ScriptedChatModel;
///
/// let model = ScriptedChatModel::always("$10M");
/// ```
#[derive(Clone)]
pub struct ScriptedChatModel {
    responder: Arc<Responder>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl ScriptedChatModel {
    /// Reply with whatever `responder` returns for each request.
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ChatRequest) -> Result<String> + Send + Sync + 'static,
    {
        Self { responder: Arc::new(responder), requests: Arc::new(Mutex::new(Vec::new())) }
    }

    /// Always reply with `text`.
    pub fn always(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Always fail with a generation error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| Err(RagError::generation("scripted", message.clone())))
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ChatRequest) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        (self.responder)(&request)
    }
}
