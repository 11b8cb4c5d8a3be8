use moka::future::Cache;
use std::time::Duration;

/// Upper bound on rendered pages held at once.
pub const MAX_CACHED_PAGES: u64 = 1_000;

/// Rendered site pages keyed by normalized request path, each valid for `ttl`.
#[derive(Clone)]
pub struct PageCache {
    entries: Cache<String, String>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, MAX_CACHED_PAGES)
    }

    pub fn with_capacity(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).await
    }

    pub async fn insert(&self, key: impl Into<String>, html: String) {
        self.entries.insert(key.into(), html).await;
    }

    /// Drops every live entry whose key matches. Returns how many were dropped.
    pub async fn invalidate_where(&self, matches: impl Fn(&str) -> bool) -> usize {
        let keys: Vec<_> = self
            .entries
            .iter()
            .filter(|(key, _)| matches(key.as_str()))
            .map(|(key, _)| key)
            .collect();
        for key in &keys {
            self.entries.invalidate(key.as_str()).await;
        }
        keys.len()
    }

    pub async fn clear(&self) -> usize {
        self.invalidate_where(|_| true).await
    }

    /// Live entries. Expired ones are not counted even before moka evicts them.
    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = PageCache::new(Duration::from_millis(100));
        cache.insert("/en", "<p>feed</p>".into()).await;
        assert_eq!(cache.get("/en").await.as_deref(), Some("<p>feed</p>"));

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(cache.get("/en").await, None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn invalidate_where_only_drops_matching_keys() {
        let cache = PageCache::new(Duration::from_secs(60));
        cache.insert("/en/post/a", "a".into()).await;
        cache.insert("/cn/post/a", "a".into()).await;
        cache.insert("/en/post/b", "b".into()).await;

        assert_eq!(cache.invalidate_where(|k| k.ends_with("/post/a")).await, 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("/en/post/b").await.is_some());
        assert_eq!(cache.clear().await, 1);
    }

    #[tokio::test]
    async fn capacity_is_bounded() {
        let cache = PageCache::with_capacity(Duration::from_secs(60), 10);
        for page in 0..200 {
            cache.insert(format!("/en?page={}", page), String::new()).await;
        }
        cache.entries.run_pending_tasks().await;
        assert!(cache.entries.entry_count() <= 10);
    }
}
