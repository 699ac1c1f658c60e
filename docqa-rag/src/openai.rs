//! OpenAI embedding and chat providers over the OpenAI HTTP API.
//!
//! This module is only available when the `openai` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::model::{ChatModel, ChatRequest};

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const PROVIDER: &str = "OpenAI";

/// Most inputs sent in one `/embeddings` request. The API accepts 2048.
pub const MAX_EMBEDDING_BATCH: usize = 1000;

/// The default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Output dimensions of the known embedding models.
fn model_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

/// Reasoning models only accept the default sampling temperature.
fn accepts_temperature(model: &str) -> bool {
    let reasoning = ["o1", "o3", "o4", "gpt-5"].iter().any(|p| model.starts_with(p));
    !reasoning || model.starts_with("gpt-5-chat")
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build().map_err(|e| RagError::Config(format!(
        "failed to build HTTP client: {e}"
    )))
}

fn require_key(api_key: String) -> Result<String> {
    if api_key.is_empty() {
        return Err(RagError::Config("OpenAI API key must not be empty".into()));
    }
    Ok(api_key)
}

// ── Shared error payload ───────────────────────────────────────────

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Turn a non-success response into a readable message.
async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail =
        serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);
    format!("API returned {status}: {detail}")
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the OpenAI `/embeddings` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new("sk-...")?.with_model("text-embedding-3-small");
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    batch_size: usize,
}

impl OpenAIEmbeddingProvider {
    /// Create a new provider with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT)?,
            api_key: require_key(api_key.into())?,
            base_url: OPENAI_API_BASE.into(),
            model: crate::config::DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: model_dimensions(crate::config::DEFAULT_EMBEDDING_MODEL),
            batch_size: MAX_EMBEDDING_BATCH,
        })
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self.dimensions = model_dimensions(&self.model);
        self
    }

    /// Point the provider at an OpenAI-compatible API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    /// Cap the number of inputs per request, clamped to `1..=MAX_EMBEDDING_BATCH`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_EMBEDDING_BATCH);
        self
    }

    fn err(message: String) -> RagError {
        RagError::Embedding { provider: PROVIDER.into(), message }
    }

    /// Embed one request's worth of inputs, returned in input order.
    async fn embed_request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest { model: &self.model, input: texts })
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "embedding request failed");
                Self::err(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            error!(provider = PROVIDER, %message, "embedding API error");
            return Err(Self::err(message));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse embedding response");
            Self::err(format!("failed to parse response: {e}"))
        })?;

        if parsed.data.len() != texts.len() {
            return Err(Self::err(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }
        parsed.data.sort_by_key(|d| d.index);
        if parsed.data.iter().enumerate().any(|(i, d)| d.index != i) {
            return Err(Self::err("response indices do not cover the request".into()));
        }
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| Self::err("API returned empty response".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let requests = texts.len().div_ceil(self.batch_size);
        debug!(
            provider = PROVIDER,
            inputs = texts.len(),
            requests,
            model = %self.model,
            "embedding batch"
        );

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.embed_request(batch).await?);
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Chat completions ───────────────────────────────────────────────

/// A [`ChatModel`] backed by the OpenAI `/chat/completions` endpoint.
///
/// The prompt is sent as a single user message; streaming is not used.
pub struct OpenAIChatModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIChatModel {
    /// Create a chat model client for `model`.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(DEFAULT_TIMEOUT)?,
            api_key: require_key(api_key.into())?,
            base_url: OPENAI_API_BASE.into(),
            model: model.into(),
        })
    }

    /// Point the client at an OpenAI-compatible API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: ChatRequest) -> Result<String> {
        debug!(
            provider = PROVIDER,
            model = %self.model,
            prompt_len = request.prompt.len(),
            "chat completion"
        );

        let temperature = accepts_temperature(&self.model).then_some(request.temperature);
        if temperature.is_none() {
            debug!(model = %self.model, "model does not accept temperature, using its default");
        }
        let body = CompletionRequest {
            model: &self.model,
            messages: [Message { role: "user", content: &request.prompt }],
            temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "chat request failed");
                RagError::generation(PROVIDER, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            error!(provider = PROVIDER, %message, "chat API error");
            return Err(RagError::generation(PROVIDER, message));
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse chat response");
            RagError::generation(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RagError::generation(PROVIDER, "response contained no message content"))
    }
}
