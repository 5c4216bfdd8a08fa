//! Two-phase content retriever

use crate::metrics::{
    RETRIEVAL_CACHE_EVENTS_TOTAL, RETRIEVAL_DURATION_SECONDS, RETRIEVAL_FALLBACK_TOTAL,
    RETRIEVAL_REQUESTS_TOTAL, RETRIEVAL_RESULTS_RETURNED,
};
use crate::models::{Document, DocumentId};
use crate::retrieval::cache::ResultCache;
use crate::retrieval::config::RetrievalConfig;
use crate::retrieval::engine::SearchEngine;
use crate::retrieval::error::{RetrievalError, RetrievalResult};
use crate::retrieval::predicate::{MatchClause, MatchField, Predicate};
use crate::retrieval::query::NormalizedQuery;
use crate::retrieval::scorer::{by_combined_rank_desc, RelevanceScorer, ScoredDocument};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Which phase produced a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    /// Combined full-text / substring / trigram query
    Primary,
    /// OR-of-words query after a weak or empty primary phase
    Fallback,
    /// The query had no words; nothing was searched
    Skipped,
}

impl SearchPhase {
    fn as_label(&self) -> &'static str {
        match self {
            SearchPhase::Primary => "primary",
            SearchPhase::Fallback => "fallback",
            SearchPhase::Skipped => "skipped",
        }
    }
}

/// Final ranked documents of one retrieval call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalOutcome {
    /// At most `max_results`, non-increasing combined rank
    pub documents: Vec<ScoredDocument>,
    pub phase: SearchPhase,
}

impl RetrievalOutcome {
    fn skipped() -> Self {
        Self {
            documents: Vec::new(),
            phase: SearchPhase::Skipped,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Finds the documents most relevant to a visitor question.
///
/// 1. Primary phase: documents matching the whole query under text search,
///    containing it as a substring, or trigram-similar to it.
/// 2. If that finds nothing, or its best combined rank is below
///    `fallback_trigger_rank`, the query is split into words and documents
///    containing any of them are re-scored with an OR-of-words query.
/// 3. Results above `min_combined_rank` are sorted and truncated to
///    `max_results`, then cached under the normalized query.
pub struct ContentRetriever {
    engine: Arc<dyn SearchEngine>,
    scorer: RelevanceScorer,
    cache: ResultCache,
    config: RetrievalConfig,
}

impl ContentRetriever {
    pub fn new(engine: Arc<dyn SearchEngine>, config: RetrievalConfig) -> RetrievalResult<Self> {
        config
            .validate()
            .map_err(RetrievalError::InvalidConfiguration)?;

        Ok(Self {
            engine,
            scorer: RelevanceScorer::new(&config),
            cache: ResultCache::new(config.cache_ttl(), config.cache_max_capacity),
            config,
        })
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Ranked documents for `raw`, or the reason none could be computed
    pub async fn search(&self, raw: &str) -> RetrievalResult<RetrievalOutcome> {
        let query = NormalizedQuery::parse(raw);
        if query.is_empty() {
            RETRIEVAL_REQUESTS_TOTAL
                .with_label_values(&[SearchPhase::Skipped.as_label()])
                .inc();
            return Ok(RetrievalOutcome::skipped());
        }

        let timer = Instant::now();
        let result = self
            .cache
            .get_or_try_insert_with(query.normalized.clone(), self.compute(&query))
            .await;
        RETRIEVAL_DURATION_SECONDS.observe(timer.elapsed().as_secs_f64());

        match result {
            Ok((outcome, cached)) => {
                RETRIEVAL_CACHE_EVENTS_TOTAL
                    .with_label_values(&[if cached { "hit" } else { "miss" }])
                    .inc();
                RETRIEVAL_REQUESTS_TOTAL
                    .with_label_values(&[outcome.phase.as_label()])
                    .inc();
                RETRIEVAL_RESULTS_RETURNED.observe(outcome.documents.len() as f64);

                debug!(
                    query = %query.normalized,
                    cached,
                    phase = outcome.phase.as_label(),
                    results = outcome.documents.len(),
                    "Retrieval finished"
                );
                Ok(outcome)
            }
            Err(err) => {
                RETRIEVAL_REQUESTS_TOTAL.with_label_values(&["error"]).inc();
                Err((*err).clone())
            }
        }
    }

    /// Ranked documents for `raw`; any failure degrades to an empty list
    pub async fn relevant_content(&self, raw: &str) -> Vec<ScoredDocument> {
        match self.search(raw).await {
            Ok(outcome) => outcome.documents,
            Err(err) => {
                warn!(
                    error = %err,
                    kind = err.kind(),
                    "Content retrieval failed, continuing without context"
                );
                Vec::new()
            }
        }
    }

    async fn compute(&self, query: &NormalizedQuery) -> RetrievalResult<RetrievalOutcome> {
        info!(query = %query.normalized, "Searching for relevant content");

        let primary = self.primary_phase(query).await?;
        let weak = primary
            .first()
            .map_or(true, |top| top.combined_rank() < self.config.fallback_trigger_rank);

        if !weak {
            return Ok(self.finish(primary, SearchPhase::Primary));
        }

        info!(
            query = %query.normalized,
            primary_candidates = primary.len(),
            "Primary search weak or empty, trying word-by-word search"
        );
        RETRIEVAL_FALLBACK_TOTAL.inc();
        let fallback = self.fallback_phase(query).await?;

        Ok(self.finish(fallback, SearchPhase::Fallback))
    }

    async fn primary_phase(&self, query: &NormalizedQuery) -> RetrievalResult<Vec<ScoredDocument>> {
        let text_query = query.all_terms();
        let predicate = Predicate::any([
            MatchClause::full_text(&text_query),
            MatchClause::contains(MatchField::Indexed, query.normalized.as_str()),
            MatchClause::trigram_above(
                MatchField::Indexed,
                query.normalized.as_str(),
                self.config.trigram_candidate_threshold,
            ),
        ]);

        let candidates = self.engine.select(&predicate).await?;
        debug!(candidates = candidates.len(), "Primary search candidates");
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let ranks = self.engine.rank(&text_query).await?;
        let phrase_ranks = self.engine.phrase_rank(&query.normalized).await?;

        let mut scored: Vec<ScoredDocument> = candidates
            .into_iter()
            .map(|document| {
                let title_trigram = self
                    .engine
                    .trigram_similarity(&document.title, &query.normalized);
                let content_trigram = self
                    .engine
                    .trigram_similarity(&document.content, &query.normalized);
                self.score(document, &ranks, &phrase_ranks, title_trigram, content_trigram)
            })
            .collect();

        scored.sort_by(by_combined_rank_desc);
        Ok(scored)
    }

    async fn fallback_phase(&self, query: &NormalizedQuery) -> RetrievalResult<Vec<ScoredDocument>> {
        let words = query.distinct_words();
        let predicate = Predicate::any(
            words
                .iter()
                .map(|word| MatchClause::contains(MatchField::Indexed, *word)),
        );

        let candidates = self.engine.select(&predicate).await?;
        debug!(candidates = candidates.len(), "Word-by-word search candidates");
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let text_query = query.any_term();
        let ranks = self.engine.rank(&text_query).await?;
        let phrase_ranks = self.engine.phrase_rank(&text_query.text).await?;

        let mut scored: Vec<ScoredDocument> = candidates
            .into_iter()
            .map(|document| {
                let title_trigram = self.engine.max_word_similarity(&document.title, &words);
                let content_trigram = self.engine.max_word_similarity(&document.content, &words);
                self.score(document, &ranks, &phrase_ranks, title_trigram, content_trigram)
            })
            .filter(|scored| scored.combined_rank() > self.config.min_combined_rank)
            .collect();

        scored.sort_by(by_combined_rank_desc);
        Ok(scored)
    }

    fn score(
        &self,
        document: Document,
        ranks: &HashMap<DocumentId, f32>,
        phrase_ranks: &HashMap<DocumentId, f32>,
        title_trigram: f32,
        content_trigram: f32,
    ) -> ScoredDocument {
        let fulltext_rank = ranks.get(&document.id).copied().unwrap_or(0.0);
        let phrase_rank = phrase_ranks.get(&document.id).copied().unwrap_or(0.0);

        ScoredDocument {
            scores: self
                .scorer
                .score(fulltext_rank, phrase_rank, title_trigram, content_trigram),
            document,
        }
    }

    /// Threshold, order, truncate
    fn finish(&self, candidates: Vec<ScoredDocument>, phase: SearchPhase) -> RetrievalOutcome {
        let mut documents: Vec<ScoredDocument> = candidates
            .into_iter()
            .filter(|c| c.combined_rank() > self.config.min_combined_rank)
            .collect();
        documents.sort_by(by_combined_rank_desc);
        documents.truncate(self.config.max_results);

        for result in &documents {
            debug!(
                title = %result.document.title,
                combined_rank = result.scores.combined_rank,
                fulltext_rank = result.scores.fulltext_rank,
                phrase_rank = result.scores.phrase_rank,
                title_trigram = result.scores.title_trigram,
                content_trigram = result.scores.content_trigram,
                "Retrieval result"
            );
        }

        RetrievalOutcome { documents, phase }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;
    use crate::retrieval::query::TextQuery;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Engine stub: substring-only selection, fixed ranks
    struct StubEngine {
        documents: Vec<Document>,
        ranks: HashMap<DocumentId, f32>,
        fail: bool,
        selects: AtomicUsize,
    }

    impl StubEngine {
        fn new(documents: Vec<Document>) -> Self {
            Self {
                documents,
                ranks: HashMap::new(),
                fail: false,
                selects: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SearchEngine for StubEngine {
        async fn select(&self, predicate: &Predicate) -> RetrievalResult<Vec<Document>> {
            self.selects.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RetrievalError::Engine("index offline".to_string()));
            }
            Ok(self
                .documents
                .iter()
                .filter(|d| predicate.matches_with(d, |_, d| self.ranks.contains_key(&d.id)))
                .cloned()
                .collect())
        }

        async fn rank(&self, _query: &TextQuery) -> RetrievalResult<HashMap<DocumentId, f32>> {
            Ok(self.ranks.clone())
        }

        async fn phrase_rank(&self, _text: &str) -> RetrievalResult<HashMap<DocumentId, f32>> {
            Ok(HashMap::new())
        }
    }

    fn retriever(engine: StubEngine, config: RetrievalConfig) -> (ContentRetriever, Arc<StubEngine>) {
        let engine = Arc::new(engine);
        let retriever = ContentRetriever::new(engine.clone(), config).unwrap();
        (retriever, engine)
    }

    fn docs(n: u64) -> Vec<Document> {
        (1..=n)
            .map(|id| {
                Document::new(
                    id,
                    format!("Service {}", id),
                    "We build cloud platforms",
                    ContentType::Text,
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_empty_query_skips_engine() {
        let (retriever, engine) = retriever(StubEngine::new(docs(2)), RetrievalConfig::default());

        let outcome = retriever.search("   ").await.unwrap();
        assert!(outcome.is_empty());
        assert_eq!(outcome.phase, SearchPhase::Skipped);
        assert_eq!(engine.selects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_results_truncated_and_sorted() {
        let mut engine = StubEngine::new(docs(8));
        for id in 1..=8 {
            engine.ranks.insert(id, id as f32 / 10.0);
        }
        let (retriever, _) = retriever(engine, RetrievalConfig::default());

        let outcome = retriever.search("cloud").await.unwrap();
        assert_eq!(outcome.phase, SearchPhase::Primary);
        assert_eq!(outcome.documents.len(), 5);

        let ids: Vec<_> = outcome.documents.iter().map(|d| d.document.id).collect();
        assert_eq!(ids, vec![8, 7, 6, 5, 4]);
    }

    #[tokio::test]
    async fn test_engine_failure_degrades_to_empty() {
        let mut engine = StubEngine::new(docs(2));
        engine.fail = true;
        let (retriever, _) = retriever(engine, RetrievalConfig::default());

        assert!(matches!(
            retriever.search("cloud").await,
            Err(RetrievalError::Engine(_))
        ));
        assert!(retriever.relevant_content("cloud").await.is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_retried_not_cached() {
        let mut engine = StubEngine::new(docs(1));
        engine.fail = true;
        let (retriever, engine) = retriever(engine, RetrievalConfig::default());

        let _ = retriever.search("cloud").await;
        let _ = retriever.search("cloud").await;
        assert_eq!(engine.selects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fallback_runs_when_primary_empty() {
        let config = RetrievalConfig {
            trigram_candidate_threshold: 0.99,
            ..Default::default()
        };
        let (retriever, engine) = retriever(StubEngine::new(docs(3)), config);

        let outcome = retriever.search("zzz platforms qqq").await.unwrap();
        assert_eq!(outcome.phase, SearchPhase::Fallback);
        assert_eq!(outcome.documents.len(), 3);
        // one select per phase
        assert_eq!(engine.selects.load(Ordering::SeqCst), 2);
    }

    /// Pricing page with a tiny full-text rank, careers page with none
    fn weak_primary_engine() -> StubEngine {
        let mut engine = StubEngine::new(vec![
            Document::new(1, "Pricing", "Autopod pricing", ContentType::Text),
            Document::new(2, "Careers", "Open roles in Bangalore", ContentType::Blog),
        ]);
        engine.ranks.insert(1, 0.01);
        engine
    }

    fn no_trigram_candidates() -> RetrievalConfig {
        RetrievalConfig {
            trigram_candidate_threshold: 0.99,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_weak_primary_replaced_by_fallback_hits() {
        let (retriever, engine) = retriever(weak_primary_engine(), no_trigram_candidates());

        let outcome = retriever.search("xyzzy roles").await.unwrap();

        assert_eq!(outcome.phase, SearchPhase::Fallback);
        let ids: Vec<_> = outcome.documents.iter().map(|d| d.document.id).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(engine.selects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_weak_primary_dropped_when_fallback_finds_nothing() {
        let (retriever, engine) = retriever(weak_primary_engine(), no_trigram_candidates());

        let outcome = retriever.search("zzz").await.unwrap();

        assert_eq!(outcome.phase, SearchPhase::Fallback);
        assert!(outcome.is_empty());
        assert_eq!(engine.selects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = RetrievalConfig {
            max_results: 0,
            ..Default::default()
        };
        let result = ContentRetriever::new(Arc::new(StubEngine::new(Vec::new())), config);
        assert!(matches!(result, Err(RetrievalError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_cache_expiry_recomputes() {
        let mut engine = StubEngine::new(docs(1));
        engine.ranks.insert(1, 0.5);
        let config = RetrievalConfig {
            cache_ttl_ms: 100,
            ..Default::default()
        };
        let (retriever, engine) = retriever(engine, config);

        retriever.search("cloud").await.unwrap();
        retriever.search("Cloud ").await.unwrap();
        assert_eq!(engine.selects.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        retriever.search("cloud").await.unwrap();
        assert_eq!(engine.selects.load(Ordering::SeqCst), 2);
    }
}
