//! Metrics poller

use super::{PollerSettings, Shutdown};
use crate::provider::CachedProvider;
use crate::resource::ResourceKind;
use crate::state::StateStore;
use std::sync::Arc;
use std::time::Duration;

/// Measures every running container, one at a time, plus this process
pub struct MetricsPoller {
    state: Arc<StateStore>,
    provider: Arc<CachedProvider>,
    interval: Duration,
    /// Pause between two containers so the state lock is not hammered
    yield_between: Duration,
}

impl MetricsPoller {
    pub fn new(
        state: Arc<StateStore>,
        provider: Arc<CachedProvider>,
        settings: &PollerSettings,
    ) -> Self {
        Self {
            state,
            provider,
            interval: settings.metrics_interval,
            yield_between: settings.metrics_yield,
        }
    }

    pub async fn run(self, mut shutdown: Shutdown) {
        while !shutdown.is_triggered() {
            self.step().await;
            if shutdown.sleep(self.interval).await {
                break;
            }
        }
        tracing::debug!("metrics poller stopped");
    }

    pub async fn step(&self) {
        let usage = self.provider.self_usage().await;
        self.state.set_self_usage(usage);

        let kind = ResourceKind::Containers;
        let ids = self.state.active_item_ids(kind);
        tracing::debug!("measuring {} running containers", ids.len());

        for id in ids {
            let metrics = self.provider.metrics(kind, &id).await;
            self.state.update_item_metric(kind, &id, metrics);
            if !self.yield_between.is_zero() {
                tokio::time::sleep(self.yield_between).await;
            }
        }
    }
}
