//! TTL-bounded response cache for directory GET requests.
//!
//! Keyed by the exact request URL (endpoint plus query string). Within the
//! TTL window a hit is indistinguishable from a fresh fetch, which lets the
//! closure resolver and matrix builder re-query the same group or user
//! without another round trip.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde_json::Value;

/// How long a cached directory response stays valid.
pub const RESPONSE_TTL: Duration = Duration::from_secs(120);

/// URL-keyed cache of raw response payloads.
///
/// Thread-safe; can be shared across tasks without external locking. Cache
/// internals never surface errors to callers: anything that would go wrong
/// inside the cache behaves as a miss and the caller proceeds to fetch.
#[derive(Clone)]
pub struct ResponseCache {
    cache: Cache<String, Arc<Value>>,
}

impl ResponseCache {
    /// Cache with the fixed 120 s production TTL.
    pub fn new() -> Self {
        Self::with_ttl(RESPONSE_TTL)
    }

    /// Cache with a custom TTL; used by tests to exercise expiry.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Returns the cached payload for a request URL, if still valid.
    pub async fn get(&self, url: &str) -> Option<Arc<Value>> {
        self.cache.get(url).await
    }

    /// Stores a response payload under its request URL.
    pub async fn insert(&self, url: &str, payload: Arc<Value>) {
        self.cache.insert(url.to_string(), payload).await;
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn hit_returns_inserted_payload() {
        let cache = ResponseCache::new();
        let payload = Arc::new(json!({"value": []}));
        cache.insert("https://example/users", Arc::clone(&payload)).await;

        let hit = cache.get("https://example/users").await.unwrap();
        assert_eq!(*hit, *payload);
        assert!(cache.get("https://example/groups").await.is_none());
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = ResponseCache::with_ttl(Duration::from_millis(50));
        cache
            .insert("https://example/users", Arc::new(json!({"value": []})))
            .await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.get("https://example/users").await.is_none());
    }
}
