//! Wire the production components from [`Settings`].

use std::sync::Arc;

use docqa_rag::{
    OpenAIChatModel, OpenAIEmbeddingProvider, PgVectorStore, QaPipeline, Result, Settings,
};
use tracing::info;

/// Connect to the pgvector database named by the settings.
pub async fn connect_store(settings: &Settings) -> Result<PgVectorStore> {
    let store = PgVectorStore::connect(&settings.pgvector_url).await?;
    info!(collection = %settings.collection, "connected to pgvector");
    Ok(store)
}

/// Build the OpenAI + pgvector pipeline.
///
/// Settings are assumed validated; this is where the first network
/// connection is made.
pub async fn build_pipeline(settings: &Settings) -> Result<QaPipeline> {
    let mut embeddings = OpenAIEmbeddingProvider::new(&settings.openai_api_key)?
        .with_model(&settings.embedding_model)
        .with_timeout(settings.request_timeout)?;
    let mut chat = OpenAIChatModel::new(&settings.openai_api_key, &settings.chat_model)?
        .with_timeout(settings.request_timeout)?;
    if let Some(base_url) = &settings.openai_base_url {
        embeddings = embeddings.with_base_url(base_url);
        chat = chat.with_base_url(base_url);
    }

    let store = connect_store(settings).await?;

    QaPipeline::builder()
        .config(settings.rag.clone())
        .embedding_provider(Arc::new(embeddings))
        .vector_store(Arc::new(store))
        .chat_model(Arc::new(chat))
        .collection(&settings.collection)
        .conflict_policy(settings.on_conflict)
        .language_policy(settings.language)
        .build()
}
