//! TTL Cache
//!
//! Thread-safe cache fronting provider reads. Every entry carries its own
//! TTL, resolved from an explicit override, else the longest matching key
//! prefix in the TTL table, else the default.
//!
//! Keys look like `<kind-prefix>[:<identity>]` so that every entry of one
//! kind can be dropped with a single prefix invalidation.

use crate::resource::ResourceKind;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// TTL used when no table entry matches
pub const DEFAULT_TTL: Duration = Duration::from_millis(2000);

/// Representative TTLs per key prefix (milliseconds)
const DEFAULT_TTL_TABLE: &[(&str, u64)] = &[
    ("containers", 1000),
    ("images", 5000),
    ("volumes", 10_000),
    ("networks", 10_000),
    ("composes", 2000),
    ("container_stats", 2000),
    ("logs", 500),
    ("self_usage", 1000),
];

/// Single cached value
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) > self.ttl
    }
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub evictions: u64,
    pub size: usize,
}

impl CacheStats {
    /// Hit rate in percent
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }
}

struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    stats: CacheStats,
}

/// TTL cache shared by the pollers and the foreground
pub struct TtlCache<V> {
    inner: Mutex<CacheInner<V>>,
    ttl_table: Vec<(String, Duration)>,
    default_ttl: Duration,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TtlCache<V> {
    /// Cache with the built-in TTL table
    pub fn new() -> Self {
        Self::with_ttls(&BTreeMap::new(), DEFAULT_TTL)
    }

    /// Cache with the built-in TTL table, overridden per prefix
    pub fn with_ttls(overrides: &BTreeMap<String, Duration>, default_ttl: Duration) -> Self {
        let mut table: BTreeMap<String, Duration> = DEFAULT_TTL_TABLE
            .iter()
            .map(|(prefix, ms)| (prefix.to_string(), Duration::from_millis(*ms)))
            .collect();
        table.extend(overrides.iter().map(|(k, v)| (k.clone(), *v)));

        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            }),
            ttl_table: table.into_iter().collect(),
            default_ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Value for `key` if present and not expired. Expired entries are evicted.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();
        let now = Instant::now();

        match inner.entries.get(key).map(|entry| entry.is_expired(now)) {
            None => {
                inner.stats.misses += 1;
                tracing::trace!("cache miss: {}", key);
                None
            }
            Some(true) => {
                inner.entries.remove(key);
                inner.stats.misses += 1;
                inner.stats.evictions += 1;
                tracing::trace!("cache expired: {}", key);
                None
            }
            Some(false) => {
                inner.stats.hits += 1;
                inner.entries.get(key).map(|entry| entry.value.clone())
            }
        }
    }

    /// Store `value`, replacing any entry with the same key
    pub fn set(&self, key: &str, value: V, ttl_override: Option<Duration>) {
        let ttl = ttl_override.unwrap_or_else(|| self.ttl_for(key));
        let mut inner = self.lock();
        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                created: Instant::now(),
                ttl,
            },
        );
        inner.stats.sets += 1;
    }

    /// TTL of the longest table prefix matching `key`, else the default
    pub fn ttl_for(&self, key: &str) -> Duration {
        self.ttl_table
            .iter()
            .filter(|(prefix, _)| key.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, ttl)| *ttl)
            .unwrap_or(self.default_ttl)
    }

    /// Drop every entry whose key starts with `prefix`, or everything.
    /// Returns the number of removed entries.
    pub fn invalidate(&self, prefix: Option<&str>) -> usize {
        let mut inner = self.lock();
        let before = inner.entries.len();
        match prefix {
            None => inner.entries.clear(),
            Some(prefix) => inner.entries.retain(|key, _| !key.starts_with(prefix)),
        }
        let removed = before - inner.entries.len();
        tracing::debug!("invalidated {} cache entries for {:?}", removed, prefix);
        removed
    }

    /// Drop the metric entry of one item so it is measured again right away
    pub fn invalidate_for_item(&self, kind: ResourceKind, id: &str) -> bool {
        let Some(prefix) = kind.metrics_prefix() else {
            return false;
        };
        let key = item_key(prefix, id);
        self.lock().entries.remove(&key).is_some()
    }

    /// Sweep expired entries, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let mut inner = self.lock();
        let now = Instant::now();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - inner.entries.len();
        inner.stats.evictions += removed as u64;
        if removed > 0 {
            tracing::debug!("cleaned up {} expired cache entries", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            size: inner.entries.len(),
            ..inner.stats
        }
    }
}

/// Key of a single item under a kind prefix
pub fn item_key(prefix: &str, id: &str) -> String {
    format!("{}:{}", prefix, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_set_then_get_returns_value() {
        let cache: TtlCache<String> = TtlCache::new();
        cache.set("containers", "list".to_string(), None);
        assert_eq!(cache.get("containers"), Some("list".to_string()));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_expired_entry_is_a_miss_and_evicted() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.set("images", 7, Some(Duration::from_millis(20)));
        sleep(Duration::from_millis(50));

        assert_eq!(cache.get("images"), None);
        assert!(cache.is_empty());
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
    }

    #[test]
    fn test_ttl_longest_prefix_wins() {
        let cache: TtlCache<u32> = TtlCache::new();
        assert_eq!(cache.ttl_for("containers"), Duration::from_millis(1000));
        assert_eq!(cache.ttl_for("container_stats:abc"), Duration::from_millis(2000));
        assert_eq!(cache.ttl_for("logs:abc"), Duration::from_millis(500));
        assert_eq!(cache.ttl_for("unknown"), DEFAULT_TTL);
    }

    #[test]
    fn test_ttl_overrides_merge_over_table() {
        let mut overrides = BTreeMap::new();
        overrides.insert("images".to_string(), Duration::from_secs(60));
        overrides.insert("images:slow".to_string(), Duration::from_secs(120));
        let cache: TtlCache<u32> = TtlCache::with_ttls(&overrides, Duration::from_secs(3));

        assert_eq!(cache.ttl_for("images"), Duration::from_secs(60));
        assert_eq!(cache.ttl_for("images:slow:x"), Duration::from_secs(120));
        assert_eq!(cache.ttl_for("volumes"), Duration::from_secs(10));
        assert_eq!(cache.ttl_for("other"), Duration::from_secs(3));
    }

    #[test]
    fn test_invalidate_prefix_removes_only_matching() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.set("container_stats:a", 1, None);
        cache.set("container_stats:b", 2, None);
        cache.set("containers", 3, None);
        cache.set("images", 4, None);

        assert_eq!(cache.invalidate(Some("container_stats")), 2);
        assert_eq!(cache.get("containers"), Some(3));
        assert_eq!(cache.get("images"), Some(4));
        assert_eq!(cache.get("container_stats:a"), None);
    }

    #[test]
    fn test_invalidate_all() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.set("a", 1, None);
        cache.set("b", 2, None);
        assert_eq!(cache.invalidate(None), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_for_item() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.set(&item_key("container_stats", "c1"), 1, None);
        cache.set(&item_key("container_stats", "c10"), 2, None);

        assert!(cache.invalidate_for_item(ResourceKind::Containers, "c1"));
        assert_eq!(cache.get("container_stats:c10"), Some(2));
        assert!(!cache.invalidate_for_item(ResourceKind::Volumes, "c10"));
    }

    #[test]
    fn test_cleanup_expired_counts() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.set("short", 1, Some(Duration::from_millis(10)));
        cache.set("long", 2, Some(Duration::from_secs(60)));
        sleep(Duration::from_millis(40));

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_hit_rate() {
        let cache: TtlCache<u32> = TtlCache::new();
        cache.set("a", 1, None);
        cache.get("a");
        cache.get("a");
        cache.get("missing");
        let rate = cache.stats().hit_rate();
        assert!((rate - 66.666).abs() < 0.1);
    }
}
