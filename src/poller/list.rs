//! Primary list poller

use super::{PollerSettings, RefreshTrigger, Shutdown};
use crate::provider::CachedProvider;
use crate::resource::ResourceKind;
use crate::state::StateStore;
use std::sync::Arc;
use std::time::Duration;

/// Kinds refreshed on the slow cadence
const SLOW_KINDS: [ResourceKind; 4] = [
    ResourceKind::Images,
    ResourceKind::Volumes,
    ResourceKind::Networks,
    ResourceKind::Compose,
];

/// Refreshes the resource collections on a short tick.
///
/// Containers are refetched every `fast_every` ticks, the other kinds every
/// `slow_every` ticks. A [`RefreshTrigger`] request resets the tick counter
/// so the next iteration refetches everything.
pub struct ListPoller {
    state: Arc<StateStore>,
    provider: Arc<CachedProvider>,
    refresh: RefreshTrigger,
    tick: Duration,
    fast_every: u64,
    slow_every: u64,
    cleanup_every: u64,
    counter: u64,
}

impl ListPoller {
    pub fn new(
        state: Arc<StateStore>,
        provider: Arc<CachedProvider>,
        refresh: RefreshTrigger,
        settings: &PollerSettings,
    ) -> Self {
        Self {
            state,
            provider,
            refresh,
            tick: settings.tick,
            fast_every: settings.fast_every.max(1),
            slow_every: settings.slow_every.max(1),
            cleanup_every: settings.cleanup_every.max(1),
            counter: 0,
        }
    }

    pub async fn run(mut self, mut shutdown: Shutdown) {
        if self.provider.check_for_update().await {
            tracing::info!("A newer version is available");
            self.state.set_update_available(true);
        }

        while !shutdown.is_triggered() {
            self.step().await;
            if shutdown.sleep(self.tick).await {
                break;
            }
        }
        tracing::debug!("list poller stopped");
    }

    /// One tick
    pub async fn step(&mut self) {
        if self.refresh.take() {
            tracing::debug!("forced refresh");
            self.counter = 0;
        }

        if self.counter % self.fast_every == 0 {
            self.refresh_kind(ResourceKind::Containers).await;
        }
        if self.counter % self.slow_every == 0 {
            for kind in SLOW_KINDS {
                self.refresh_kind(kind).await;
            }
        }
        if self.counter > 0 && self.counter % self.cleanup_every == 0 {
            self.provider.cleanup_expired();
        }

        self.counter = self.counter.wrapping_add(1);
    }

    async fn refresh_kind(&self, kind: ResourceKind) {
        let items = self.provider.list(kind).await;
        self.state.replace_collection(kind, items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::provider::mock::MockProvider;
    use crate::resource::tests::{container, volume};
    use std::sync::atomic::Ordering;

    struct Fixture {
        mock: Arc<MockProvider>,
        state: Arc<StateStore>,
        provider: Arc<CachedProvider>,
        refresh: RefreshTrigger,
        poller: ListPoller,
    }

    impl Fixture {
        /// One tick with a cold cache, so every refresh reaches the provider
        async fn step(&mut self) {
            self.provider.cache().invalidate(None);
            self.poller.step().await;
        }
    }

    fn fixture() -> Fixture {
        let mock = Arc::new(MockProvider::new());
        let state = Arc::new(StateStore::default());
        let provider = Arc::new(CachedProvider::new(mock.clone(), Arc::new(TtlCache::new())));
        let refresh = RefreshTrigger::default();
        let settings = PollerSettings {
            fast_every: 2,
            slow_every: 10,
            cleanup_every: 60,
            ..PollerSettings::default()
        };
        let poller = ListPoller::new(state.clone(), provider.clone(), refresh.clone(), &settings);
        Fixture {
            mock,
            state,
            provider,
            refresh,
            poller,
        }
    }

    #[tokio::test]
    async fn test_first_tick_loads_every_kind() {
        let mut f = fixture();
        f.mock
            .set_list(ResourceKind::Containers, vec![container("c1", "web", "running")]);
        f.mock.set_list(ResourceKind::Volumes, vec![volume("data")]);

        f.step().await;

        let snap = f.state.snapshot();
        assert_eq!(snap.items(ResourceKind::Containers).len(), 1);
        assert_eq!(snap.items(ResourceKind::Volumes).len(), 1);
        assert_eq!(f.mock.list_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_cadence_fast_and_slow() {
        let mut f = fixture();
        for _ in 0..10 {
            f.step().await;
        }
        // ticks 0,2,4,6,8 -> containers; tick 0 -> four slow kinds
        assert_eq!(f.mock.list_calls.load(Ordering::SeqCst), 5 + 4);
    }

    #[tokio::test]
    async fn test_force_refresh_resets_counter() {
        let mut f = fixture();
        f.step().await;
        f.step().await;
        let before = f.mock.list_calls.load(Ordering::SeqCst);

        f.refresh.request();
        f.step().await;
        assert_eq!(f.mock.list_calls.load(Ordering::SeqCst), before + 5);
    }

    #[tokio::test]
    async fn test_provider_failure_keeps_polling() {
        let mut f = fixture();
        f.mock.fail_reads.store(true, Ordering::SeqCst);
        f.step().await;
        assert!(f.state.snapshot().items(ResourceKind::Containers).is_empty());

        f.mock.fail_reads.store(false, Ordering::SeqCst);
        f.mock
            .set_list(ResourceKind::Containers, vec![container("c1", "web", "running")]);
        f.step().await;
        f.step().await;
        assert_eq!(f.state.snapshot().items(ResourceKind::Containers).len(), 1);
    }

    #[tokio::test]
    async fn test_run_checks_for_update_and_stops() {
        let f = fixture();
        f.mock.update_available.store(true, Ordering::SeqCst);
        let (trigger, shutdown) = super::super::shutdown_channel();
        let state = f.state.clone();

        let task = tokio::spawn(f.poller.run(shutdown));
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.trigger();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("poller did not stop")
            .unwrap();

        assert!(state.snapshot().update_available);
    }
}
