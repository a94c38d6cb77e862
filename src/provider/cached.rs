//! Cache-through provider
//!
//! Wraps a [`ResourceProvider`] with the shared [`TtlCache`]. Reads are served
//! from the cache while fresh; provider failures are logged and turned into
//! empty collections or placeholder metrics so no caller ever sees them.
//! Successful mutations invalidate the affected prefixes right away.

use super::{Action, LogStream, ResourceProvider};
use crate::cache::{item_key, CacheStats, TtlCache};
use crate::resource::{Metrics, ResourceItem, ResourceKind};
use std::sync::Arc;

const SELF_USAGE_KEY: &str = "self_usage";

/// Values stored in the shared cache
#[derive(Debug, Clone)]
pub enum CacheValue {
    Items(Vec<ResourceItem>),
    Metrics(Metrics),
    Text(String),
}

/// Result of a mutating call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub ok: bool,
    pub reason: Option<String>,
}

impl MutationOutcome {
    pub fn success() -> Self {
        Self { ok: true, reason: None }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }
}

/// Provider reads fronted by the TTL cache
pub struct CachedProvider {
    provider: Arc<dyn ResourceProvider>,
    cache: Arc<TtlCache<CacheValue>>,
}

impl CachedProvider {
    pub fn new(provider: Arc<dyn ResourceProvider>, cache: Arc<TtlCache<CacheValue>>) -> Self {
        Self { provider, cache }
    }

    pub fn cache(&self) -> &Arc<TtlCache<CacheValue>> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Collection of `kind`; empty when the provider is unavailable
    pub async fn list(&self, kind: ResourceKind) -> Vec<ResourceItem> {
        let key = kind.cache_prefix();
        if let Some(CacheValue::Items(items)) = self.cache.get(key) {
            tracing::debug!("cache hit: {}", key);
            return items;
        }

        match self.provider.list_resources(kind).await {
            Ok(items) => {
                self.cache.set(key, CacheValue::Items(items.clone()), None);
                items
            }
            Err(e) => {
                tracing::warn!("Failed to list {}: {:#}", kind, e);
                Vec::new()
            }
        }
    }

    /// Metrics of one item; placeholder when unavailable
    pub async fn metrics(&self, kind: ResourceKind, id: &str) -> Metrics {
        let Some(prefix) = kind.metrics_prefix() else {
            return Metrics::placeholder();
        };
        let key = item_key(prefix, id);
        if let Some(CacheValue::Metrics(metrics)) = self.cache.get(&key) {
            return metrics;
        }

        match self.provider.get_metrics(kind, id).await {
            Ok(metrics) => {
                self.cache.set(&key, CacheValue::Metrics(metrics), None);
                metrics
            }
            Err(e) => {
                tracing::warn!("Failed to get metrics for {}: {:#}", id, e);
                Metrics::placeholder()
            }
        }
    }

    /// Usage of this process; empty when unavailable
    pub async fn self_usage(&self) -> String {
        if let Some(CacheValue::Text(usage)) = self.cache.get(SELF_USAGE_KEY) {
            return usage;
        }

        match self.provider.self_usage().await {
            Ok(usage) => {
                self.cache.set(SELF_USAGE_KEY, CacheValue::Text(usage.clone()), None);
                usage
            }
            Err(e) => {
                tracing::warn!("Failed to read self usage: {:#}", e);
                String::new()
            }
        }
    }

    /// Run a mutation. On success the cached lists it affects are dropped
    /// so the next read sees the change.
    pub async fn mutate(&self, kind: ResourceKind, id: &str, action: &Action) -> MutationOutcome {
        tracing::info!("{} {} {}", action.present_participle(), kind.noun(1), id);

        match self.provider.mutate(kind, id, action).await {
            Ok(()) => {
                self.invalidate_after(kind, id, action);
                MutationOutcome::success()
            }
            Err(e) => {
                tracing::warn!("{} {} {} failed: {:#}", action, kind.noun(1), id, e);
                MutationOutcome::failure(format!("{:#}", e))
            }
        }
    }

    fn invalidate_after(&self, kind: ResourceKind, id: &str, action: &Action) {
        match invalidation_prefixes(kind, action) {
            None => {
                self.cache.invalidate(None);
            }
            Some(prefixes) => {
                for prefix in prefixes {
                    self.cache.invalidate(Some(prefix));
                }
                self.cache.invalidate_for_item(kind, id);
            }
        }
    }

    /// Attach to the log stream of `id`
    pub async fn stream_logs(&self, id: &str, tail: usize) -> Option<Box<dyn LogStream>> {
        match self.provider.stream_logs(id, tail).await {
            Ok(stream) => Some(stream),
            Err(e) => {
                tracing::warn!("Failed to attach logs for {}: {:#}", id, e);
                None
            }
        }
    }

    pub async fn check_for_update(&self) -> bool {
        self.provider.check_for_update().await
    }

    /// Sweep expired cache entries
    pub fn cleanup_expired(&self) -> usize {
        self.cache.cleanup_expired()
    }
}

/// Cache prefixes made stale by `action` on `kind`; `None` means everything
fn invalidation_prefixes(kind: ResourceKind, action: &Action) -> Option<&'static [&'static str]> {
    if *action == Action::Prune {
        return None;
    }
    // Compose projects are derived from container labels, so the two
    // lists go stale together.
    let prefixes: &'static [&'static str] = match kind {
        ResourceKind::Containers => &["containers", "composes"],
        ResourceKind::Compose => &["composes", "containers"],
        ResourceKind::Images => &["images"],
        ResourceKind::Volumes => &["volumes"],
        ResourceKind::Networks => &["networks"],
    };
    Some(prefixes)
}
