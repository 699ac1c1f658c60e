//! Property tests for in-memory vector store search ordering.

use std::collections::HashMap;

use docqa_rag::document::Chunk;
use docqa_rag::inmemory::InMemoryVectorStore;
use docqa_rag::vectorstore::VectorStore;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate a chunk with a normalized embedding.
fn arb_chunk(dim: usize) -> impl Strategy<Value = Chunk> {
    ("doc-[0-9]{1,3}", "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(id, content, embedding)| Chunk { id, content, embedding, ..Default::default() },
    )
}

fn dedupe(chunks: &[Chunk]) -> Vec<Chunk> {
    let mut deduped: HashMap<String, Chunk> = HashMap::new();
    for chunk in chunks {
        deduped.entry(chunk.id.clone()).or_insert_with(|| chunk.clone());
    }
    deduped.into_values().collect()
}

/// *For any* set of stored chunks, searching returns at most `top_k`
/// results, ordered by descending cosine similarity.
mod prop_inmemory_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            chunks in proptest::collection::vec(arb_chunk(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let unique_chunks = dedupe(&chunks);
            let unique_count = unique_chunks.len();

            let results = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store.create_collection("test", DIM).await.unwrap();
                store.insert("test", &unique_chunks).await.unwrap();
                store.search("test", &query, top_k).await.unwrap()
            });

            prop_assert!(results.len() <= top_k);
            prop_assert_eq!(results.len(), top_k.min(unique_count));

            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }

        #[test]
        fn stored_vector_is_its_own_nearest_neighbour(
            chunks in proptest::collection::vec(arb_chunk(DIM), 1..20),
            pick in any::<prop::sample::Index>(),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let unique_chunks = dedupe(&chunks);
            let target = unique_chunks[pick.index(unique_chunks.len())].clone();

            let results = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store.create_collection("test", DIM).await.unwrap();
                store.insert("test", &unique_chunks).await.unwrap();
                store.search("test", &target.embedding, unique_chunks.len()).await.unwrap()
            });

            // Duplicated directions may tie with the target at the top score.
            let best = results[0].score;
            let position = results.iter().position(|r| r.chunk.id == target.id).unwrap();
            prop_assert!((results[position].score - best).abs() < 1e-5);
        }
    }
}
