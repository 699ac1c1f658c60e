//! End-to-end ingest-and-ask scenarios over the in-memory backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docqa_rag::mock::{HashingEmbeddingProvider, ScriptedChatModel};
use docqa_rag::{
    AnswerKind, Chunk, ChatRequest, ConflictPolicy, Document, InMemoryVectorStore, IngestReport,
    Language, LanguagePolicy, QaPipeline, RagConfig, RagError, RecursiveChunker, RetrievalResult,
    VectorStore,
};

const REPORT: &str = "Alfa Energia Holding was founded in 1998 in Belo Horizonte.\n\n\
Alfa Energia Holding reported revenue of $10M in 2024.\n\n\
The board approved a new solar plant in the north region.";

/// Delegates to an in-memory store and counts every call.
#[derive(Default)]
struct CountingStore {
    inner: InMemoryVectorStore,
    calls: AtomicUsize,
}

impl CountingStore {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl VectorStore for CountingStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> docqa_rag::Result<()> {
        self.hit();
        self.inner.create_collection(name, dimensions).await
    }

    async fn delete_collection(&self, name: &str) -> docqa_rag::Result<()> {
        self.hit();
        self.inner.delete_collection(name).await
    }

    async fn insert(&self, collection: &str, chunks: &[Chunk]) -> docqa_rag::Result<()> {
        self.hit();
        self.inner.insert(collection, chunks).await
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> docqa_rag::Result<()> {
        self.hit();
        self.inner.upsert(collection, chunks).await
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> docqa_rag::Result<()> {
        self.hit();
        self.inner.delete(collection, ids).await
    }

    async fn clear(&self, collection: &str) -> docqa_rag::Result<()> {
        self.hit();
        self.inner.clear(collection).await
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> docqa_rag::Result<Vec<RetrievalResult>> {
        self.hit();
        self.inner.search(collection, embedding, top_k).await
    }
}

fn section<'a>(prompt: &'a str, start: &str, end: &str) -> &'a str {
    let from = prompt.find(start).map(|i| i + start.len()).unwrap_or(0);
    let rest = &prompt[from..];
    &rest[..rest.find(end).unwrap_or(rest.len())]
}

fn keywords(text: &str) -> Vec<String> {
    const STOP: &[&str] = &["what", "which", "from", "does", "that", "this", "qual", "quais"];
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() > 3 && !STOP.contains(&w.as_str()))
        .collect()
}

/// Answers with the context sentence sharing the most keywords with the
/// question, or with the refusal sentence the prompt dictates.
fn extractive_model() -> ScriptedChatModel {
    ScriptedChatModel::new(|request: &ChatRequest| {
        let prompt = request.prompt.as_str();
        let context = section(prompt, "CONTEXT:\n", "\n\nRULES:");
        let question = section(prompt, "USER QUESTION:\n", "\n\nANSWER");
        let refusal = section(prompt, "respond exactly:\n  \"", "\"");
        let wanted = keywords(question);

        let best = context
            .lines()
            .filter(|line| !line.starts_with("DOCUMENT (Score:"))
            .flat_map(|line| line.split_inclusive(". "))
            .map(|sentence| {
                let hits = keywords(sentence).iter().filter(|w| wanted.contains(w)).count();
                (hits, sentence.trim())
            })
            .filter(|(hits, _)| *hits >= 2)
            .max_by_key(|(hits, _)| *hits);

        Ok(best.map(|(_, s)| s.to_string()).unwrap_or_else(|| refusal.to_string()))
    })
}

fn pipeline_with(
    store: Arc<dyn VectorStore>,
    model: ScriptedChatModel,
    language: LanguagePolicy,
) -> QaPipeline {
    QaPipeline::builder()
        .config(RagConfig::builder().chunk_size(120).chunk_overlap(20).build().unwrap())
        .embedding_provider(Arc::new(HashingEmbeddingProvider::new(256)))
        .vector_store(store)
        .chat_model(Arc::new(model))
        .collection("alfa_report")
        .language_policy(language)
        .build()
        .unwrap()
}

fn pipeline(model: ScriptedChatModel) -> QaPipeline {
    pipeline_with(Arc::new(InMemoryVectorStore::new()), model, LanguagePolicy::Auto)
}

fn report() -> Vec<Document> {
    vec![Document::new(REPORT).with_metadata("source", "document.pdf").with_metadata("page", 0)]
}

#[tokio::test]
async fn answers_revenue_from_the_document() {
    let pipeline = pipeline(extractive_model());
    let report = pipeline.ingest(&report()).await.unwrap();
    assert!(report.chunk_count() >= 2);

    let answer = pipeline.ask("What is the revenue of Alfa Energia Holding?").await.unwrap();
    assert_eq!(answer.kind, AnswerKind::Grounded);
    assert_eq!(answer.language, Language::English);
    assert!(answer.text.contains("$10M"), "got {:?}", answer.text);
}

#[tokio::test]
async fn refuses_questions_outside_the_document() {
    let model = extractive_model();
    let pipeline = pipeline(model.clone());
    pipeline.ingest(&report()).await.unwrap();

    let answer = pipeline.ask("What is the capital of France?").await.unwrap();
    assert_eq!(answer.text, "I don't have the necessary information to answer your question.");
    assert!(answer.is_refusal());
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn refuses_in_portuguese_for_portuguese_questions() {
    let pipeline = pipeline(extractive_model());
    pipeline.ingest(&report()).await.unwrap();

    let answer = pipeline.ask("Qual é a capital da França?").await.unwrap();
    assert_eq!(answer.language, Language::Portuguese);
    assert_eq!(answer.text, "Não tenho as informações necessárias para responder à sua pergunta.");
    assert_eq!(answer.kind, AnswerKind::Refusal);
}

#[tokio::test]
async fn fixed_language_overrides_detection() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline =
        pipeline_with(store, extractive_model(), LanguagePolicy::Fixed(Language::Portuguese));
    pipeline.ingest(&report()).await.unwrap();

    let answer = pipeline.ask("What is the capital of France?").await.unwrap();
    assert_eq!(answer.text, Language::Portuguese.refusal());
}

#[tokio::test]
async fn empty_document_never_touches_the_store() {
    let store = Arc::new(CountingStore::default());
    let pipeline = pipeline_with(store.clone(), extractive_model(), LanguagePolicy::Auto);

    let report = pipeline.ingest(&[Document::new(""), Document::new("  \n\n ")]).await.unwrap();
    assert_eq!(report, IngestReport::Empty);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn empty_chunk_list_never_touches_the_store() {
    let store = Arc::new(CountingStore::default());
    let pipeline = pipeline_with(store.clone(), extractive_model(), LanguagePolicy::Auto);

    let report = pipeline.ingest_chunks(Vec::new()).await.unwrap();
    assert_eq!(report, IngestReport::Empty);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn chunks_split_up_front_ingest_like_documents() {
    let by_documents = pipeline(extractive_model());
    let by_chunks = pipeline(extractive_model());

    let chunks = RecursiveChunker::from_config(by_chunks.config()).split_documents(&report());
    assert_eq!(chunks, by_chunks.split(&report()));

    let expected = by_documents.ingest(&report()).await.unwrap();
    let stored = by_chunks.ingest_chunks(chunks).await.unwrap();
    assert_eq!(stored, expected);
    assert!(stored.chunk_count() >= 2);
}

#[tokio::test]
async fn empty_collection_refuses_without_calling_the_model() {
    let model = extractive_model();
    let store = Arc::new(InMemoryVectorStore::new());
    store.create_collection("alfa_report", 256).await.unwrap();
    let pipeline = pipeline_with(store, model.clone(), LanguagePolicy::Auto);

    let answer = pipeline.ask("What is the revenue?").await.unwrap();
    assert!(answer.is_refusal());
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn prompt_carries_scored_context_and_question() {
    let model = ScriptedChatModel::always("$10M");
    let pipeline = pipeline(model.clone());
    pipeline.ingest(&report()).await.unwrap();
    pipeline.ask("What is the revenue of Alfa Energia Holding?").await.unwrap();

    let requests = model.requests();
    assert_eq!(requests.len(), 1);
    let prompt = &requests[0].prompt;
    assert!(prompt.contains("DOCUMENT (Score: "));
    assert!(prompt.contains("reported revenue of $10M in 2024."));
    assert!(prompt.contains("USER QUESTION:\nWhat is the revenue of Alfa Energia Holding?"));
    assert_eq!(requests[0].temperature, 0.0);
}

#[tokio::test]
async fn reingesting_replaces_previous_chunks() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline_with(store.clone(), extractive_model(), LanguagePolicy::Auto);

    let first = pipeline.ingest(&report()).await.unwrap();
    pipeline.ingest(&[Document::new("A short replacement page.")]).await.unwrap();

    assert!(first.chunk_count() > 1);
    assert_eq!(store.len("alfa_report").await, Some(1));
    let kept = store.get("alfa_report", "doc-0").await.unwrap();
    assert_eq!(kept.content, "A short replacement page.");
}

#[tokio::test]
async fn fail_policy_rejects_reingestion() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = QaPipeline::builder()
        .embedding_provider(Arc::new(HashingEmbeddingProvider::new(64)))
        .vector_store(store.clone())
        .chat_model(Arc::new(ScriptedChatModel::always("unused")))
        .collection("alfa_report")
        .conflict_policy(ConflictPolicy::Fail)
        .build()
        .unwrap();

    pipeline.ingest(&report()).await.unwrap();
    let err = pipeline.ingest(&report()).await.unwrap_err();
    assert!(matches!(err, RagError::Storage { .. }), "got {err:?}");
}

#[tokio::test]
async fn model_failure_surfaces_as_generation_error() {
    let pipeline = pipeline(ScriptedChatModel::failing("rate limited"));
    pipeline.ingest(&report()).await.unwrap();

    let err = pipeline.ask("What is the revenue of Alfa Energia Holding?").await.unwrap_err();
    assert!(matches!(err, RagError::Generation { .. }));
}

#[tokio::test]
async fn each_chunk_is_its_own_best_match() {
    let pipeline = pipeline(ScriptedChatModel::always("unused"));
    let IngestReport::Stored { chunks } = pipeline.ingest(&report()).await.unwrap() else {
        panic!("expected stored chunks");
    };

    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.id, format!("doc-{i}"));
        assert_eq!(chunk.metadata["source"], "document.pdf");
        let results = pipeline.store().similarity_search(&chunk.content, 1).await.unwrap();
        assert_eq!(results[0].chunk.id, chunk.id);
    }
}
