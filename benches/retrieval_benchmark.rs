// Retrieval Performance Benchmarks
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tour_concierge::models::{ContentType, Document};
use tour_concierge::retrieval::{trigram, ContentRetriever, RetrievalConfig, SearchEngine};
use tour_concierge::search::{ContentIndex, SearchConfig};

const TOPICS: [&str; 8] = [
    "pricing", "careers", "services", "platforms", "cloud", "design", "support", "security",
];

fn corpus(size: u64) -> Vec<Document> {
    (1..=size)
        .map(|id| {
            let topic = TOPICS[(id as usize) % TOPICS.len()];
            Document::new(
                id,
                format!("{} overview {}", topic, id),
                format!(
                    "Everything about our {} offering, including {} details and customer stories number {}.",
                    topic,
                    TOPICS[(id as usize + 3) % TOPICS.len()],
                    id
                ),
                ContentType::Text,
            )
        })
        .collect()
}

fn build_retriever(rt: &Runtime, size: u64) -> ContentRetriever {
    rt.block_on(async {
        let index = ContentIndex::new(SearchConfig::default()).await.unwrap();
        index.index_documents(&corpus(size)).await.unwrap();
        let engine: Arc<dyn SearchEngine> = Arc::new(index);
        ContentRetriever::new(engine, RetrievalConfig::default()).unwrap()
    })
}

fn retrieval_uncached(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("retrieval_uncached");

    for size in [100u64, 1000] {
        let retriever = build_retriever(&rt, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.to_async(&rt).iter(|| async {
                retriever.cache().invalidate_all();
                retriever
                    .search(black_box("cloud pricing details"))
                    .await
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn retrieval_fallback(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let retriever = build_retriever(&rt, 1000);

    c.bench_function("retrieval_fallback_1000", |b| {
        b.to_async(&rt).iter(|| async {
            retriever.cache().invalidate_all();
            retriever
                .search(black_box("securty xyzzy support"))
                .await
                .unwrap()
        });
    });
}

fn retrieval_cached(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let retriever = build_retriever(&rt, 1000);
    rt.block_on(retriever.search("cloud pricing details")).unwrap();

    c.bench_function("retrieval_cache_hit", |b| {
        b.to_async(&rt).iter(|| async {
            retriever
                .search(black_box("cloud pricing details"))
                .await
                .unwrap()
        });
    });
}

fn trigram_similarity(c: &mut Criterion) {
    let text = "Everything about our pricing offering, including cloud details and customer stories.";

    c.bench_function("trigram_similarity", |b| {
        b.iter(|| trigram::similarity(black_box(text), black_box("pricing model")))
    });
}

criterion_group!(
    benches,
    retrieval_uncached,
    retrieval_fallback,
    retrieval_cached,
    trigram_similarity
);
criterion_main!(benches);
