//! In-memory TTL cache for upstream responses
//!
//! Provides a `CacheManager` that stores one payload per key together with the
//! instant it was fetched. Entries are never removed when they expire; they are
//! refreshed in place on the next access.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

/// A cached payload and the timestamps that govern its freshness
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    /// The cached data
    data: T,
    /// When the data was fetched
    cached_at: DateTime<Utc>,
    /// When the cache entry expires
    expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(data: T, cached_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            data,
            cached_at,
            expires_at: cached_at + ttl,
        }
    }

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Result of reading from cache, including metadata about cache freshness
#[derive(Debug, Clone)]
pub struct CachedData<T> {
    /// The cached data
    pub data: T,
    /// When the data was originally fetched
    pub cached_at: DateTime<Utc>,
    /// Whether the cache entry has expired
    pub is_expired: bool,
}

/// Per-key cell. The async lock serializes refreshes of one key.
type Cell<T> = Arc<AsyncMutex<Option<CacheEntry<T>>>>;

struct Slot<T> {
    cell: Cell<T>,
    last_access: u64,
}

struct Slots<K, T> {
    map: HashMap<K, Slot<T>>,
    tick: u64,
}

/// Keyed TTL cache with single-flight refresh and optional LRU capacity
///
/// Lookups take a short synchronous lock on the slot map, then an async lock on
/// the key's own cell. Holding the cell lock across the refresh means concurrent
/// callers for the same expired key wait for one upstream fetch instead of
/// issuing their own.
pub struct CacheManager<K, T> {
    slots: Mutex<Slots<K, T>>,
    capacity: Option<usize>,
}

impl<K, T> Default for CacheManager<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> CacheManager<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    /// Creates an unbounded cache
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Slots {
                map: HashMap::new(),
                tick: 0,
            }),
            capacity: None,
        }
    }

    /// Creates a cache holding at most `capacity` keys
    ///
    /// When a new key would exceed the capacity, the least recently used key
    /// is evicted. A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::new()
        }
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.slots.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if `key` currently has a slot
    pub fn contains_key(&self, key: &K) -> bool {
        self.slots.lock().map.contains_key(key)
    }

    /// Finds or creates the cell for `key`, marking it as most recently used
    fn cell(&self, key: &K) -> Cell<T> {
        let mut slots = self.slots.lock();
        slots.tick += 1;
        let tick = slots.tick;

        if let Some(slot) = slots.map.get_mut(key) {
            slot.last_access = tick;
            return Arc::clone(&slot.cell);
        }

        if let Some(capacity) = self.capacity {
            while slots.map.len() >= capacity {
                let oldest = slots
                    .map
                    .iter()
                    .min_by_key(|(_, slot)| slot.last_access)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(k) => {
                        slots.map.remove(&k);
                    }
                    None => break,
                }
            }
        }

        let cell: Cell<T> = Arc::new(AsyncMutex::new(None));
        slots.map.insert(
            key.clone(),
            Slot {
                cell: Arc::clone(&cell),
                last_access: tick,
            },
        );
        cell
    }

    /// Writes data to the cache with the given TTL, replacing any previous entry
    pub async fn write(&self, key: &K, data: T, ttl: Duration) {
        let cell = self.cell(key);
        let mut entry = cell.lock().await;
        *entry = Some(CacheEntry::new(data, Utc::now(), ttl));
    }

    /// Reads data from the cache
    ///
    /// Returns `None` if the key has never been written. Expired entries are
    /// still returned, with `is_expired = true`.
    pub async fn read(&self, key: &K) -> Option<CachedData<T>> {
        let cell = {
            let slots = self.slots.lock();
            Arc::clone(&slots.map.get(key)?.cell)
        };
        let entry = cell.lock().await;
        entry.as_ref().map(|entry| CachedData {
            data: entry.data.clone(),
            cached_at: entry.cached_at,
            is_expired: entry.is_expired_at(Utc::now()),
        })
    }

    /// Returns the fresh payload for `key`, or refreshes it
    ///
    /// If the entry exists and was fetched less than `ttl` ago, it is returned
    /// without calling `refresh`. Otherwise `refresh` runs, and an `Ok` value
    /// is stored with the time the refresh started and returned. An `Err` is
    /// returned as-is and leaves the previous entry untouched.
    pub async fn get_or_refresh<F, Fut, E>(&self, key: K, ttl: Duration, refresh: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let cell = self.cell(&key);
        let mut entry = cell.lock().await;

        let now = Utc::now();
        if let Some(cached) = entry.as_ref() {
            if !cached.is_expired_at(now) {
                return Ok(cached.data.clone());
            }
        }

        let data = refresh().await?;
        *entry = Some(CacheEntry::new(data.clone(), now, ttl));
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    #[derive(Debug, Clone, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn test_data(name: &str, value: i32) -> TestData {
        TestData {
            name: name.to_string(),
            value,
        }
    }

    fn create_test_cache() -> CacheManager<String, TestData> {
        CacheManager::new()
    }

    #[tokio::test]
    async fn test_read_returns_none_for_missing_key() {
        let cache = create_test_cache();

        let result = cache.read(&"nonexistent_key".to_string()).await;

        assert!(result.is_none(), "Should return None for missing key");
    }

    #[tokio::test]
    async fn test_read_returns_data_with_is_expired_false_for_fresh_cache() {
        let cache = create_test_cache();
        let data = test_data("fresh", 100);

        cache
            .write(&"fresh_key".to_string(), data.clone(), Duration::hours(1))
            .await;

        let result = cache.read(&"fresh_key".to_string()).await.expect("Should read fresh cache");

        assert_eq!(result.data, data);
        assert!(!result.is_expired, "Fresh cache should not be expired");
    }

    #[tokio::test]
    async fn test_read_returns_data_with_is_expired_true_for_expired_cache() {
        let cache = create_test_cache();
        let data = test_data("expired", 0);

        // Zero TTL expires immediately
        cache
            .write(&"expired_key".to_string(), data.clone(), Duration::zero())
            .await;

        let result = cache
            .read(&"expired_key".to_string())
            .await
            .expect("Should read expired cache");

        assert_eq!(result.data, data);
        assert!(result.is_expired, "Cache with 0 TTL should be expired");
    }

    #[tokio::test]
    async fn test_cached_at_timestamp_is_recorded() {
        let cache = create_test_cache();

        let before = Utc::now();
        cache
            .write(&"timestamp_key".to_string(), test_data("timestamp", 999), Duration::hours(1))
            .await;
        let after = Utc::now();

        let result = cache.read(&"timestamp_key".to_string()).await.expect("Should read cache");

        assert!(result.cached_at >= before, "cached_at should be after write started");
        assert!(result.cached_at <= after, "cached_at should be before write finished");
    }

    #[tokio::test]
    async fn test_overwrite_existing_cache() {
        let cache = create_test_cache();
        let key = "overwrite_key".to_string();

        cache.write(&key, test_data("first", 1), Duration::hours(1)).await;
        cache.write(&key, test_data("second", 2), Duration::hours(1)).await;

        let result = cache.read(&key).await.expect("Should read cache");

        assert_eq!(result.data, test_data("second", 2), "Cache should contain latest data");
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_get_or_refresh_hits_within_ttl() {
        let cache = create_test_cache();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let fetch = move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok::<_, ()>(test_data("fetched", n as i32))
        };

        let first = cache
            .get_or_refresh("k".to_string(), Duration::minutes(10), fetch)
            .await
            .unwrap();
        let second = cache
            .get_or_refresh("k".to_string(), Duration::minutes(10), fetch)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_get_or_refresh_refetches_after_ttl() {
        let cache = create_test_cache();
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let ttl = Duration::milliseconds(20);

        let fetch = move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok::<_, ()>(test_data("fetched", n as i32))
        };

        let first = cache.get_or_refresh("k".to_string(), ttl, fetch).await.unwrap();
        tokio::time::sleep(StdDuration::from_millis(40)).await;
        let second = cache.get_or_refresh("k".to_string(), ttl, fetch).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(first.value, 1);
        assert_eq!(second.value, 2);
    }

    #[tokio::test]
    async fn test_degraded_value_is_cached_for_full_ttl() {
        let cache: CacheManager<&'static str, Vec<i32>> = CacheManager::new();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        for _ in 0..3 {
            let result = cache
                .get_or_refresh("week", Duration::minutes(10), move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(Vec::new())
                })
                .await
                .unwrap();
            assert!(result.is_empty());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_error_is_not_cached() {
        let cache = create_test_cache();
        let key = "k".to_string();

        let err = cache
            .get_or_refresh(key.clone(), Duration::minutes(10), || async { Err::<TestData, _>("boom") })
            .await;
        assert_eq!(err, Err("boom"));
        assert!(cache.read(&key).await.is_none());

        let ok = cache
            .get_or_refresh(key.clone(), Duration::minutes(10), || async {
                Ok::<_, &str>(test_data("ok", 1))
            })
            .await;
        assert_eq!(ok, Ok(test_data("ok", 1)));
    }

    #[tokio::test]
    async fn test_refresh_error_keeps_previous_entry() {
        let cache = create_test_cache();
        let key = "k".to_string();
        cache.write(&key, test_data("old", 1), Duration::zero()).await;

        let err = cache
            .get_or_refresh(key.clone(), Duration::minutes(10), || async { Err::<TestData, _>(()) })
            .await;

        assert!(err.is_err());
        let cached = cache.read(&key).await.expect("previous entry should remain");
        assert_eq!(cached.data, test_data("old", 1));
        assert!(cached.is_expired);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refresh_is_single_flight() {
        let cache = Arc::new(create_test_cache());
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks = (0..8).map(|_| {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                cache
                    .get_or_refresh("shared".to_string(), Duration::minutes(1), move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(StdDuration::from_millis(20)).await;
                        Ok::<_, ()>(test_data("shared", 7))
                    })
                    .await
            })
        });

        let results = join_all(tasks).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap().unwrap(), test_data("shared", 7));
        }
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let cache: CacheManager<String, i32> = CacheManager::with_capacity(2);
        let ttl = Duration::minutes(1);

        cache.write(&"a".to_string(), 1, ttl).await;
        cache.write(&"b".to_string(), 2, ttl).await;
        // Touch "a" so "b" becomes the oldest
        assert!(cache.read(&"a".to_string()).await.is_some());
        let _ = cache
            .get_or_refresh("a".to_string(), ttl, || async { Ok::<_, ()>(0) })
            .await;
        cache.write(&"c".to_string(), 3, ttl).await;

        assert_eq!(cache.len(), 2);
        assert!(cache.contains_key(&"a".to_string()));
        assert!(!cache.contains_key(&"b".to_string()));
        assert!(cache.contains_key(&"c".to_string()));
    }

    #[tokio::test]
    async fn test_unbounded_cache_keeps_all_keys() {
        let cache: CacheManager<String, i32> = CacheManager::new();
        for i in 0..50 {
            cache.write(&format!("k{}", i), i, Duration::minutes(1)).await;
        }
        assert_eq!(cache.len(), 50);
    }
}
