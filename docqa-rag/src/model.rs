//! Language model abstraction used by the answer generator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single-prompt completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The fully formatted prompt, sent as one user message.
    pub prompt: String,
    /// Sampling temperature. The generator always sends `0.0`.
    pub temperature: f32,
}

impl ChatRequest {
    /// Create a request with deterministic sampling.
    pub fn deterministic(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), temperature: 0.0 }
    }
}

/// A language model that turns a prompt into text.
///
/// Implementations do not retry; failures surface as
/// [`RagError::Generation`](crate::RagError::Generation) and the caller decides.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// The model identifier, used in logs.
    fn name(&self) -> &str;

    /// Submit the request and return the raw response text.
    async fn complete(&self, request: ChatRequest) -> Result<String>;
}
