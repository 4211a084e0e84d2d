//! Client-side query cache with an explicit read/write/ensure interface
//!
//! The store is injected into loaders and hooks rather than accessed as
//! ambient global state. Entries are JSON snapshots keyed by a hierarchical
//! [`QueryKey`] under a shared `enterprise` namespace. Writes are
//! last-write-wins; concurrent `ensure_query_data` calls for the same key are
//! de-duplicated through a per-key async lock.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;

use crate::metrics::metrics;

/// Hierarchical cache key under the shared `enterprise` namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    /// Build a key from raw segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Key for the learner's enterprise linkage aggregate
    pub fn enterprise_learner(username: &str) -> Self {
        Self::new(["enterprise", "learner", username])
    }

    /// Key for an enterprise's academies
    pub fn academies(enterprise_uuid: &str) -> Self {
        Self::new(["enterprise", enterprise_uuid, "academies"])
    }

    /// Key for the learner's course enrollments under an enterprise
    pub fn course_enrollments(enterprise_uuid: &str) -> Self {
        Self::new(["enterprise", enterprise_uuid, "enrollments"])
    }

    /// Key for a catalog containment check
    pub fn contains_content(enterprise_uuid: &str, content_key: &str) -> Self {
        Self::new(["enterprise", enterprise_uuid, "contains_content", content_key])
    }

    /// Key for a can-redeem policy resolution
    pub fn can_redeem(enterprise_uuid: &str, content_key: &str) -> Self {
        Self::new(["enterprise", enterprise_uuid, "can_redeem", content_key])
    }

    /// Whether this key starts with the given segments
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        prefix.len() <= self.0.len()
            && self.0.iter().zip(prefix).all(|(seg, pre)| seg == pre)
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(":"))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    updated_at: Instant,
}

/// Injected client-side query cache
pub struct QueryStore {
    entries: DashMap<QueryKey, CacheEntry>,
    in_flight: DashMap<QueryKey, Arc<tokio::sync::Mutex<()>>>,
    stale_after: Duration,
}

impl QueryStore {
    /// Create a store with the given staleness window
    pub fn new(stale_after: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            stale_after,
        }
    }

    /// Write a snapshot for `key`, replacing any prior value (last-write-wins)
    pub fn set_query_data<T: Serialize>(&self, key: QueryKey, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.entries.insert(
                    key,
                    CacheEntry { value, updated_at: Instant::now() },
                );
            }
            Err(error) => {
                tracing::warn!(key = %key, %error, "Dropping unserializable cache write");
            }
        }
    }

    /// Typed read of the cached snapshot, regardless of staleness
    pub fn get_query_data<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.entries.get(key)?;
        serde_json::from_value(entry.value.clone()).ok()
    }

    /// Whether a cached snapshot exists and is within the staleness window
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.updated_at.elapsed() < self.stale_after)
            .unwrap_or(false)
    }

    /// Return the cached value when fresh, otherwise run `fetch` and cache
    /// its result.
    ///
    /// Concurrent callers for the same key serialize on a per-key lock, so a
    /// burst of loaders priming the same entry issues a single fetch.
    pub async fn ensure_query_data<T, E, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if self.is_fresh(&key) {
            if let Some(value) = self.get_query_data(&key) {
                metrics().cache_hits.inc();
                return Ok(value);
            }
        }

        let lock = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another caller may have populated the entry while we waited.
        if self.is_fresh(&key) {
            if let Some(value) = self.get_query_data(&key) {
                metrics().cache_hits.inc();
                return Ok(value);
            }
        }

        metrics().cache_misses.inc();
        let value = fetch().await?;
        self.set_query_data(key, &value);
        Ok(value)
    }

    /// Drop the snapshot for `key`
    pub fn invalidate(&self, key: &QueryKey) {
        self.entries.remove(key);
    }

    /// Drop every snapshot whose key starts with `prefix`
    pub fn invalidate_prefix(&self, prefix: &[&str]) {
        self.entries.retain(|key, _| !key.starts_with(prefix));
    }
}

impl std::fmt::Debug for QueryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryStore")
            .field("entries", &self.entries.len())
            .field("stale_after", &self.stale_after)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let store = QueryStore::new(Duration::from_secs(60));
        let key = QueryKey::academies("uuid-1");
        store.set_query_data(key.clone(), &vec!["a".to_string(), "b".to_string()]);
        let value: Vec<String> = store.get_query_data(&key).unwrap();
        assert_eq!(value, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn last_write_wins() {
        let store = QueryStore::new(Duration::from_secs(60));
        let key = QueryKey::new(["enterprise", "x"]);
        store.set_query_data(key.clone(), &1u64);
        store.set_query_data(key.clone(), &2u64);
        assert_eq!(store.get_query_data::<u64>(&key), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn ensure_serves_fresh_entry_without_refetch() {
        let store = QueryStore::new(Duration::from_secs(60));
        let key = QueryKey::enterprise_learner("alice");
        let fetches = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<u64, &str> = store
                .ensure_query_data(key.clone(), || {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    async { Ok(7) }
                })
                .await;
            assert_eq!(value.unwrap(), 7);
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ensure_refetches_after_staleness_window() {
        let store = QueryStore::new(Duration::from_secs(60));
        let key = QueryKey::enterprise_learner("alice");
        let fetches = AtomicUsize::new(0);

        let fetch = || {
            fetches.fetch_add(1, Ordering::SeqCst);
            async { Ok::<u64, &str>(7) }
        };
        store.ensure_query_data(key.clone(), fetch).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        store.ensure_query_data(key.clone(), fetch).await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fetch_errors_are_not_cached() {
        let store = QueryStore::new(Duration::from_secs(60));
        let key = QueryKey::new(["enterprise", "err"]);

        let result: Result<u64, &str> = store
            .ensure_query_data(key.clone(), || async { Err("boom") })
            .await;
        assert!(result.is_err());
        assert_eq!(store.get_query_data::<u64>(&key), None);
    }

    #[tokio::test]
    async fn invalidate_prefix_drops_namespace() {
        let store = QueryStore::new(Duration::from_secs(60));
        store.set_query_data(QueryKey::academies("a"), &1u64);
        store.set_query_data(QueryKey::academies("b"), &2u64);
        store.set_query_data(QueryKey::new(["other", "c"]), &3u64);

        store.invalidate_prefix(&["enterprise"]);
        assert_eq!(store.get_query_data::<u64>(&QueryKey::academies("a")), None);
        assert_eq!(store.get_query_data::<u64>(&QueryKey::new(["other", "c"])), Some(3));
    }
}
