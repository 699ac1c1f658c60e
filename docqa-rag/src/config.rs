//! Configuration for ingestion and question answering.
//!
//! [`RagConfig`] holds the tunable pipeline parameters and is validated by
//! its builder. [`Settings`] is the process-level configuration read once
//! from the environment at startup and then passed by reference to every
//! component constructor.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chunking::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::error::{RagError, Result};
use crate::prompt::LanguagePolicy;
use crate::vectorstore::ConflictPolicy;

/// Default number of chunks retrieved per question.
pub const DEFAULT_TOP_K: usize = 10;

/// Default OpenAI embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default OpenAI chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-5-nano";

/// Variables that must be present before anything else runs.
pub const REQUIRED_VARS: [&str; 3] = ["OPENAI_API_KEY", "PGVECTOR_URL", "PGVECTOR_COLLECTION"];

/// Configuration parameters for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

/// Process-level settings, validated once and immutable afterwards.
#[derive(Clone, PartialEq)]
pub struct Settings {
    /// API key used for both embeddings and chat completions.
    pub openai_api_key: String,
    /// PostgreSQL connection URL of the pgvector database.
    pub pgvector_url: String,
    /// Name of the collection chunks are stored in.
    pub collection: String,
    /// Embedding model (`OPENAI_MODEL`).
    pub embedding_model: String,
    /// Chat model (`OPENAI_CHAT_MODEL`).
    pub chat_model: String,
    /// Alternative OpenAI-compatible API base (`OPENAI_BASE_URL`).
    pub openai_base_url: Option<String>,
    /// Language the answer is rendered in.
    pub language: LanguagePolicy,
    /// What ingestion does when chunk ids already exist in the collection.
    pub on_conflict: ConflictPolicy,
    /// Timeout applied to every HTTP request made to the model provider.
    pub request_timeout: Duration,
    /// Pipeline parameters.
    pub rag: RagConfig,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("openai_api_key", &"<redacted>")
            .field("pgvector_url", &"<redacted>")
            .field("collection", &self.collection)
            .field("embedding_model", &self.embedding_model)
            .field("chat_model", &self.chat_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("language", &self.language)
            .field("on_conflict", &self.on_conflict)
            .field("request_timeout", &self.request_timeout)
            .field("rag", &self.rag)
            .finish()
    }
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] naming the first missing required variable,
    /// or describing an unparsable optional one.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| RagError::Config(format!("environment variable {key} not set")))
        };
        let optional =
            |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let openai_api_key = required(REQUIRED_VARS[0])?;
        let pgvector_url = required(REQUIRED_VARS[1])?;
        let collection = required(REQUIRED_VARS[2])?;

        let top_k = match optional("DOCQA_TOP_K") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| {
                    RagError::Config(format!("DOCQA_TOP_K must be a positive integer, got '{raw}'"))
                })?,
            None => DEFAULT_TOP_K,
        };
        let language = match optional("DOCQA_ANSWER_LANGUAGE") {
            Some(raw) => raw.parse()?,
            None => LanguagePolicy::default(),
        };
        let on_conflict = match optional("DOCQA_ON_CONFLICT") {
            Some(raw) => raw.parse()?,
            None => ConflictPolicy::default(),
        };
        let request_timeout = match optional("DOCQA_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse::<u64>().map_err(|_| {
                RagError::Config(format!(
                    "DOCQA_REQUEST_TIMEOUT_SECS must be an integer, got '{raw}'"
                ))
            })?),
            None => Duration::from_secs(60),
        };

        Ok(Self {
            openai_api_key,
            pgvector_url,
            collection,
            embedding_model: optional("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            chat_model: optional("OPENAI_CHAT_MODEL")
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            openai_base_url: optional("OPENAI_BASE_URL"),
            language,
            on_conflict,
            request_timeout,
            rag: RagConfig::builder().top_k(top_k).build()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::prompt::Language;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("OPENAI_API_KEY", "sk-test"),
        ("PGVECTOR_URL", "postgres://localhost/rag"),
        ("PGVECTOR_COLLECTION", "documents"),
    ];

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let settings = Settings::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(settings.embedding_model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(settings.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(settings.language, LanguagePolicy::Auto);
        assert_eq!(settings.on_conflict, ConflictPolicy::Replace);
        assert_eq!(settings.rag, RagConfig::default());
        assert_eq!(settings.rag.chunk_size, 1000);
        assert_eq!(settings.rag.chunk_overlap, 150);
    }

    #[test]
    fn each_missing_required_var_is_reported() {
        for skip in REQUIRED_VARS {
            let vars: Vec<_> = REQUIRED.iter().copied().filter(|(k, _)| *k != skip).collect();
            let err = Settings::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(&err, RagError::Config(msg) if msg.contains(skip)), "{err}");
        }
    }

    #[test]
    fn blank_required_var_counts_as_missing() {
        let mut vars = REQUIRED.to_vec();
        vars[2] = ("PGVECTOR_COLLECTION", "  ");
        assert!(Settings::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn optional_vars_override_defaults() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("OPENAI_MODEL", "text-embedding-3-large"),
            ("DOCQA_TOP_K", "4"),
            ("DOCQA_ANSWER_LANGUAGE", "pt"),
            ("DOCQA_ON_CONFLICT", "fail"),
        ]);
        let settings = Settings::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(settings.embedding_model, "text-embedding-3-large");
        assert_eq!(settings.rag.top_k, 4);
        assert_eq!(settings.language, LanguagePolicy::Fixed(Language::Portuguese));
        assert_eq!(settings.on_conflict, ConflictPolicy::Fail);
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("DOCQA_TOP_K", "0"));
        assert!(matches!(Settings::from_lookup(lookup(&vars)), Err(RagError::Config(_))));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let settings = Settings::from_lookup(lookup(&REQUIRED)).unwrap();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("sk-test"));
        assert!(!rendered.contains("postgres://"));
    }

    #[test]
    fn builder_rejects_overlap_not_smaller_than_size() {
        let err = RagConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
        assert!(RagConfig::builder().chunk_size(0).chunk_overlap(0).build().is_err());
    }
}
