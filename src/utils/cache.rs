//! Part Cache
//!
//! The lookup contract used by event glue that sits above packet assembly:
//! given a keyed cache and raw event data, pull the cached part (refreshing
//! it from the data) or construct a fresh one when the key is absent.
//!
//! [`MemoryCache`] is a TTL-bounded in-memory implementation with FIFO
//! eviction once `max_entries` is reached.

use crate::config::CacheConfig;
use crate::error::Result;
use crate::utils::metrics::global_metrics;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Asynchronous keyed cache of parts
pub trait PartCache<K, V>: Send + Sync {
    /// Clone of the cached value, if present
    fn get<'a>(&'a self, key: &'a K) -> BoxFuture<'a, Option<V>>;

    /// Remove and return the cached value, if present
    fn pull<'a>(&'a self, key: &'a K) -> BoxFuture<'a, Option<V>>;

    /// Insert or replace the value for `key`
    fn set(&self, key: K, value: V) -> BoxFuture<'_, ()>;
}

/// An entity that can be built from, or refreshed with, raw event data
pub trait Part: Sized {
    type Raw;

    /// Build a fresh part from raw data
    fn create(raw: &Self::Raw) -> Result<Self>;

    /// Refresh an existing part with raw data
    fn fill(&mut self, raw: &Self::Raw);
}

/// Where a part returned by [`pull_or_create`] came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<V> {
    /// Pulled from the cache and refreshed
    Cached(V),
    /// Constructed from raw data
    Created(V),
}

impl<V> Fetched<V> {
    pub fn was_cached(&self) -> bool {
        matches!(self, Fetched::Cached(_))
    }

    pub fn into_inner(self) -> V {
        match self {
            Fetched::Cached(value) | Fetched::Created(value) => value,
        }
    }
}

/// Pull `key` from `cache`, refreshing it with `raw`, or create a new part from `raw`.
pub async fn pull_or_create<K, V, C>(cache: &C, key: &K, raw: &V::Raw) -> Result<Fetched<V>>
where
    C: PartCache<K, V> + ?Sized,
    V: Part,
{
    match cache.pull(key).await {
        Some(mut part) => {
            global_metrics().cache_hit();
            part.fill(raw);
            Ok(Fetched::Cached(part))
        }
        None => {
            global_metrics().cache_miss();
            V::create(raw).map(Fetched::Created)
        }
    }
}

#[derive(Debug)]
struct Entry<V> {
    added_at: Instant,
    value: V,
}

#[derive(Debug)]
struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    insertion_order: VecDeque<K>,
}

/// TTL-based in-memory part cache
#[derive(Debug)]
pub struct MemoryCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    ttl: Duration,
    max_entries: usize,
}

impl<K, V> MemoryCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::with_config(&CacheConfig::default())
    }

    pub fn with_config(config: &CacheConfig) -> Self {
        Self::with_settings(config.ttl, config.max_entries)
    }

    pub fn with_settings(ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
            ttl,
            // A zero limit would evict every insert
            max_entries: max_entries.max(1),
        }
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let mut inner = self.inner.lock().await;
        Self::cleanup_expired(&mut inner, self.ttl);
        inner.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
        inner.insertion_order.clear();
        debug!("Part cache cleared");
    }

    fn cleanup_expired(inner: &mut Inner<K, V>, ttl: Duration) {
        let now = Instant::now();
        let initial_count = inner.entries.len();

        inner
            .entries
            .retain(|_, entry| now.duration_since(entry.added_at) < ttl);

        if inner.entries.len() != initial_count {
            let Inner {
                entries,
                insertion_order,
            } = inner;
            insertion_order.retain(|key| entries.contains_key(key));
            debug!(
                removed = initial_count - entries.len(),
                "Cleaned up expired part cache entries"
            );
        }
    }

    #[inline]
    fn evict_oldest(inner: &mut Inner<K, V>, max_entries: usize) {
        while inner.entries.len() > max_entries {
            match inner.insertion_order.pop_front() {
                Some(key) => {
                    inner.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl<K, V> Default for MemoryCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> PartCache<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug,
    V: Clone + Send + Sync,
{
    fn get<'a>(&'a self, key: &'a K) -> BoxFuture<'a, Option<V>> {
        async move {
            let mut inner = self.inner.lock().await;
            Self::cleanup_expired(&mut inner, self.ttl);
            inner.entries.get(key).map(|entry| entry.value.clone())
        }
        .boxed()
    }

    fn pull<'a>(&'a self, key: &'a K) -> BoxFuture<'a, Option<V>> {
        async move {
            let mut inner = self.inner.lock().await;
            Self::cleanup_expired(&mut inner, self.ttl);
            let entry = inner.entries.remove(key)?;
            inner.insertion_order.retain(|queued| queued != key);
            debug!(?key, "Pulled part from cache");
            Some(entry.value)
        }
        .boxed()
    }

    fn set(&self, key: K, value: V) -> BoxFuture<'_, ()> {
        async move {
            let mut inner = self.inner.lock().await;
            Self::cleanup_expired(&mut inner, self.ttl);

            let entry = Entry {
                added_at: Instant::now(),
                value,
            };
            if inner.entries.insert(key.clone(), entry).is_some() {
                inner.insertion_order.retain(|queued| queued != &key);
            } else {
                Self::evict_oldest(&mut inner, self.max_entries);
            }
            inner.insertion_order.push_back(key);
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Rule {
        name: String,
        created: bool,
    }

    impl Part for Rule {
        type Raw = String;

        fn create(raw: &String) -> Result<Self> {
            Ok(Rule {
                name: raw.clone(),
                created: true,
            })
        }

        fn fill(&mut self, raw: &String) {
            self.name = raw.clone();
            self.created = false;
        }
    }

    #[tokio::test]
    async fn test_pull_removes_entry() {
        let cache = MemoryCache::with_settings(Duration::from_secs(60), 10);
        cache.set(1u64, "a".to_string()).await;

        assert_eq!(cache.pull(&1).await.as_deref(), Some("a"));
        assert_eq!(cache.pull(&1).await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_keeps_entry() {
        let cache = MemoryCache::with_settings(Duration::from_secs(60), 10);
        cache.set("k".to_string(), 5u8).await;

        assert_eq!(cache.get(&"k".to_string()).await, Some(5));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn test_pull_or_create_prefers_cache() {
        let cache: MemoryCache<u64, Rule> = MemoryCache::new();
        cache
            .set(
                7,
                Rule {
                    name: "old".to_string(),
                    created: true,
                },
            )
            .await;

        let raw = "new".to_string();
        let first = pull_or_create(&cache, &7, &raw).await.unwrap();
        assert!(first.was_cached());
        assert_eq!(
            first.into_inner(),
            Rule {
                name: "new".to_string(),
                created: false,
            }
        );

        let second = pull_or_create(&cache, &7, &raw).await.unwrap();
        assert!(!second.was_cached());
        assert!(second.into_inner().created);
    }

    #[tokio::test]
    async fn test_expiration() {
        let cache = MemoryCache::with_settings(Duration::from_millis(10), 10);
        cache.set(1u8, 1u8).await;

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(cache.get(&1).await, None);
    }

    #[tokio::test]
    async fn test_max_entries_limit() {
        let cache = MemoryCache::with_settings(Duration::from_secs(60), 5);
        for i in 0..10u32 {
            cache.set(i, i).await;
        }

        assert_eq!(cache.len().await, 5);
        // Oldest entries were evicted first
        assert_eq!(cache.get(&0).await, None);
        assert_eq!(cache.get(&9).await, Some(9));
    }
}
