//! Question-answering pipeline orchestrator.
//!
//! [`QaPipeline`] composes a [`RecursiveChunker`], a
//! [`VectorStoreAdapter`], a [`Retriever`] and a [`GroundedAnswerGenerator`]
//! into the two operations the binaries need: ingest documents and answer a
//! question.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{QaPipeline, RagConfig, InMemoryVectorStore};
//! use docqa_rag::mock::{HashingEmbeddingProvider, ScriptedChatModel};
//!
//! let pipeline = QaPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::new(256)))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .chat_model(Arc::new(ScriptedChatModel::always("...")))
//!     .collection("docs")
//!     .build()?;
//!
//! pipeline.ingest(&pages).await?;
//! let answer = pipeline.ask("What is the revenue?").await?;
//! ```

use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use crate::chunking::RecursiveChunker;
use crate::config::RagConfig;
use crate::document::{Chunk, Document};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generator::{Answer, GroundedAnswerGenerator};
use crate::model::ChatModel;
use crate::prompt::{LanguagePolicy, PromptTemplate};
use crate::retriever::Retriever;
use crate::store::{VectorStoreAdapter, sequential_ids};
use crate::vectorstore::{ConflictPolicy, VectorStore};

/// Outcome of an ingestion run.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestReport {
    /// The documents produced no chunks; the store was not touched.
    Empty,
    /// Chunks were embedded and stored.
    Stored {
        /// The stored chunks, with ids and embeddings.
        chunks: Vec<Chunk>,
    },
}

impl IngestReport {
    /// Number of chunks stored.
    pub fn chunk_count(&self) -> usize {
        match self {
            IngestReport::Empty => 0,
            IngestReport::Stored { chunks } => chunks.len(),
        }
    }
}

/// The ingest-and-answer pipeline. Construct one via [`QaPipeline::builder()`].
pub struct QaPipeline {
    config: RagConfig,
    chunker: RecursiveChunker,
    store: Arc<VectorStoreAdapter>,
    retriever: Retriever,
    generator: GroundedAnswerGenerator,
}

impl QaPipeline {
    /// Create a new [`QaPipelineBuilder`].
    pub fn builder() -> QaPipelineBuilder {
        QaPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return the vector store adapter.
    pub fn store(&self) -> &Arc<VectorStoreAdapter> {
        &self.store
    }

    /// Return the retriever.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Return the answer generator.
    pub fn generator(&self) -> &GroundedAnswerGenerator {
        &self.generator
    }

    /// Split documents into chunks without storing them.
    pub fn split(&self, documents: &[Document]) -> Vec<Chunk> {
        self.chunker.split_documents(documents)
    }

    /// Ingest documents: split → assign `doc-N` ids → embed → store.
    ///
    /// Zero chunks is a clean no-op that returns [`IngestReport::Empty`]
    /// without contacting the store.
    ///
    /// # Errors
    ///
    /// Any embedding or storage failure aborts the run.
    pub async fn ingest(&self, documents: &[Document]) -> Result<IngestReport> {
        self.ingest_chunks(self.split(documents)).await
    }

    /// Store chunks that were already split, in order, as `doc-0..doc-N-1`.
    ///
    /// Behaves like [`ingest`](Self::ingest) after the split, including the
    /// [`IngestReport::Empty`] no-op for an empty list.
    pub async fn ingest_chunks(&self, chunks: Vec<Chunk>) -> Result<IngestReport> {
        if chunks.is_empty() {
            info!("no chunks produced, nothing to ingest");
            return Ok(IngestReport::Empty);
        }

        let ids = sequential_ids(chunks.len());
        self.store.ensure_collection().await?;
        let stored = self.store.add(&chunks, &ids).await?;

        info!(
            chunk_count = stored.len(),
            collection = self.store.collection(),
            "ingested chunks"
        );
        Ok(IngestReport::Stored { chunks: stored })
    }

    /// Answer one question: retrieve → format → generate.
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let span = info_span!("ask", question_len = question.len());
        async {
            let context = self.retriever.retrieve(question).await?;
            self.generator.answer(question, &context).await
        }
        .instrument(span)
        .await
    }
}

/// Builder for constructing a [`QaPipeline`].
///
/// `embedding_provider`, `vector_store`, `chat_model` and `collection` are
/// required; everything else has defaults.
#[derive(Default)]
pub struct QaPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chat_model: Option<Arc<dyn ChatModel>>,
    collection: Option<String>,
    conflict_policy: ConflictPolicy,
    language: LanguagePolicy,
    template: Option<PromptTemplate>,
}

impl QaPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the language model.
    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(model);
        self
    }

    /// Set the collection name.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Set the re-ingestion policy.
    pub fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Set the answer-language policy.
    pub fn language_policy(mut self, policy: LanguagePolicy) -> Self {
        self.language = policy;
        self
    }

    /// Replace the default prompt template.
    pub fn prompt_template(mut self, template: PromptTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Build the [`QaPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing or the
    /// collection name is blank.
    pub fn build(self) -> Result<QaPipeline> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let chat_model =
            self.chat_model.ok_or_else(|| RagError::Config("chat_model is required".to_string()))?;
        let collection = self
            .collection
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| RagError::Config("collection is required".to_string()))?;

        let store = Arc::new(
            VectorStoreAdapter::new(embedding_provider, vector_store, collection)
                .with_conflict_policy(self.conflict_policy),
        );
        let retriever = Retriever::new(store.clone()).with_top_k(config.top_k);
        let mut generator =
            GroundedAnswerGenerator::new(chat_model).with_language_policy(self.language);
        if let Some(template) = self.template {
            generator = generator.with_template(template);
        }

        Ok(QaPipeline {
            chunker: RecursiveChunker::from_config(&config),
            config,
            store,
            retriever,
            generator,
        })
    }
}
