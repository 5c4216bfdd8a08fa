use moka::future::Cache;
use std::hash::Hash;
use std::time::Duration;

/// Generic expiring cache using Moka.
///
/// Entries expire after `ttl` without access, so abandoned visitor sessions
/// are dropped on their own.
#[derive(Clone)]
pub struct AppCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    cache: Cache<K, V>,
}

impl<K, V> AppCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_idle(ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: K, value: V) {
        self.cache.insert(key, value).await;
    }

    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_replaces_value() {
        let cache = AppCache::new(100, Duration::from_secs(60));

        cache.insert("visitor".to_string(), "first".to_string()).await;
        cache.insert("visitor".to_string(), "second".to_string()).await;
        assert_eq!(cache.get(&"visitor".to_string()).await, Some("second".to_string()));
        assert_eq!(cache.entry_count().await, 1);
    }

    #[tokio::test]
    async fn test_cache_idle_expiry() {
        let cache = AppCache::new(100, Duration::from_millis(100));

        cache.insert("key".to_string(), 1u32).await;
        assert!(cache.get(&"key".to_string()).await.is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get(&"key".to_string()).await.is_none());
        assert_eq!(cache.entry_count().await, 0);
    }
}
