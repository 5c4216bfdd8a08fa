//! Expiring cache of retrieval results

use crate::retrieval::error::RetrievalError;
use crate::retrieval::retriever::RetrievalOutcome;
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Retrieval results keyed by normalized query, expiring after a fixed TTL.
///
/// Concurrent misses on the same key share one computation. Failed
/// computations are never stored.
#[derive(Clone)]
pub struct ResultCache {
    cache: Cache<String, RetrievalOutcome>,
}

impl ResultCache {
    pub fn new(ttl: Duration, max_capacity: Option<u64>) -> Self {
        let mut builder = Cache::builder().time_to_live(ttl);
        if let Some(capacity) = max_capacity {
            builder = builder.max_capacity(capacity);
        }

        Self {
            cache: builder.build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<RetrievalOutcome> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: String, value: RetrievalOutcome) {
        self.cache.insert(key, value).await;
    }

    /// Cached value, or the result of `init` stored under `key`.
    ///
    /// The flag is `true` when the value was served from the cache.
    pub async fn get_or_try_insert_with<F>(
        &self,
        key: String,
        init: F,
    ) -> Result<(RetrievalOutcome, bool), Arc<RetrievalError>>
    where
        F: Future<Output = Result<RetrievalOutcome, RetrievalError>>,
    {
        let entry = self.cache.entry(key).or_try_insert_with(init).await?;
        let cached = !entry.is_fresh();
        Ok((entry.into_value(), cached))
    }

    pub async fn invalidate(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::retriever::SearchPhase;

    fn outcome(phase: SearchPhase) -> RetrievalOutcome {
        RetrievalOutcome {
            documents: Vec::new(),
            phase,
        }
    }

    #[tokio::test]
    async fn test_cache_basic_operations() {
        let cache = ResultCache::new(Duration::from_secs(60), None);

        cache
            .insert("pricing".to_string(), outcome(SearchPhase::Primary))
            .await;
        assert_eq!(
            cache.get("pricing").await.map(|o| o.phase),
            Some(SearchPhase::Primary)
        );

        cache.invalidate("pricing").await;
        assert!(cache.get("pricing").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_ttl() {
        let cache = ResultCache::new(Duration::from_millis(100), None);

        cache
            .insert("key".to_string(), outcome(SearchPhase::Fallback))
            .await;
        assert!(cache.get("key").await.is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get("key").await.is_none());
    }

    #[tokio::test]
    async fn test_get_or_try_insert_reports_hits() {
        let cache = ResultCache::new(Duration::from_secs(60), None);

        let (_, cached) = cache
            .get_or_try_insert_with("q".to_string(), async {
                Ok(outcome(SearchPhase::Primary))
            })
            .await
            .unwrap();
        assert!(!cached);

        let (value, cached) = cache
            .get_or_try_insert_with("q".to_string(), async {
                Ok(outcome(SearchPhase::Fallback))
            })
            .await
            .unwrap();
        assert!(cached);
        assert_eq!(value.phase, SearchPhase::Primary);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = ResultCache::new(Duration::from_secs(60), None);

        let failed = cache
            .get_or_try_insert_with("q".to_string(), async {
                Err(RetrievalError::Engine("offline".to_string()))
            })
            .await;
        assert!(failed.is_err());
        assert!(cache.get("q").await.is_none());
        assert_eq!(cache.entry_count().await, 0);
    }
}
