//! # docqa-rag
//!
//! Retrieval-grounded question answering over ingested documents.
//!
//! Documents are split by a [`RecursiveChunker`], embedded by an
//! [`EmbeddingProvider`] and stored through a [`VectorStore`]. A question is
//! answered by retrieving the nearest chunks into an [`EvidenceContext`] and
//! asking a [`ChatModel`] to answer strictly from it, in the question's
//! language, or to return the fixed refusal sentence.
//!
//! ## Feature flags
//!
//! | Feature    | Enables |
//! |------------|---------|
//! | `openai`   | [`openai::OpenAIEmbeddingProvider`] and [`openai::OpenAIChatModel`] |
//! | `pgvector` | [`pgvector::PgVectorStore`] |
//! | `pdf`      | [`loader::PdfLoader`] |
//! | `full`     | all of the above |
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::{Document, InMemoryVectorStore, QaPipeline};
//! use docqa_rag::mock::{HashingEmbeddingProvider, ScriptedChatModel};
//!
//! let pipeline = QaPipeline::builder()
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::new(256)))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .chat_model(Arc::new(ScriptedChatModel::always("$10M")))
//!     .collection("docs")
//!     .build()?;
//!
//! let page = Document::new("Alfa Energia Holding reported revenue of $10M in 2024.");
//! pipeline.ingest(&[page]).await?;
//! let answer = pipeline.ask("What is the revenue of Alfa Energia Holding?").await?;
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generator;
mod hash;
pub mod inmemory;
pub mod mock;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod store;
pub mod vectorstore;

#[cfg(feature = "pdf")]
pub mod loader;
#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "pgvector")]
pub mod pgvector;

pub use chunking::RecursiveChunker;
pub use config::{RagConfig, RagConfigBuilder, Settings};
pub use document::{Chunk, Document, Metadata, RetrievalResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generator::{Answer, AnswerKind, GroundedAnswerGenerator};
pub use inmemory::InMemoryVectorStore;
pub use model::{ChatModel, ChatRequest};
pub use pipeline::{IngestReport, QaPipeline, QaPipelineBuilder};
pub use prompt::{Language, LanguagePolicy, PromptTemplate};
pub use retriever::{EvidenceContext, Retriever};
pub use store::{VectorStoreAdapter, sequential_ids};
pub use vectorstore::{ConflictPolicy, VectorStore};

#[cfg(feature = "pdf")]
pub use loader::PdfLoader;
#[cfg(feature = "openai")]
pub use openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
#[cfg(feature = "pgvector")]
pub use pgvector::PgVectorStore;
