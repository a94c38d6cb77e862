//! Background pollers
//!
//! Three independent tokio tasks keep the [`StateStore`] current:
//!
//! - [`list::ListPoller`] - resource collections on a short tick, with a
//!   fast cadence for containers and a slow one for everything else
//! - [`metrics::MetricsPoller`] - per-container utilization and self usage
//! - [`logs::LogPoller`] - follows the log stream of the selected container
//!
//! Pollers only talk to the rest of the application through the state
//! store mutators and the [`CachedProvider`]. Each loop checks the shutdown
//! flag once per iteration; a provider call that is already running is
//! allowed to finish.

pub mod list;
pub mod logs;
pub mod metrics;

use crate::config::Config;
use crate::provider::CachedProvider;
use crate::state::StateStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub use list::ListPoller;
pub use logs::LogPoller;
pub use metrics::MetricsPoller;

/// How long [`Pollers::shutdown`] waits for in-flight work
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// Sending half of the shutdown flag
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Cooperative shutdown flag observed by the pollers
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Sleep for `duration` unless shutdown is requested first.
    /// Returns true when the caller should stop.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        let rx = &mut self.rx;
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            // Err means every trigger is gone, which also means stop
            _ = rx.wait_for(|stop| *stop) => return true,
        }
        self.is_triggered()
    }
}

pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Flag asking the list poller for an immediate full refetch
#[derive(Clone, Default)]
pub struct RefreshTrigger(Arc<AtomicBool>);

impl RefreshTrigger {
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Consume a pending request
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// Timing of all three pollers
#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub tick: Duration,
    /// Containers are refreshed every `fast_every` ticks
    pub fast_every: u64,
    /// All other kinds are refreshed every `slow_every` ticks
    pub slow_every: u64,
    /// Expired cache entries are swept every `cleanup_every` ticks
    pub cleanup_every: u64,
    pub metrics_interval: Duration,
    pub metrics_yield: Duration,
    pub log_tail: usize,
    pub log_read_timeout: Duration,
    pub log_terminate_wait: Duration,
    pub log_retry_backoff: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl PollerSettings {
    pub fn from_config(config: &Config) -> Self {
        let refresh = &config.refresh;
        let logs = &config.logs;
        Self {
            tick: Duration::from_millis(refresh.tick_ms.max(1)),
            fast_every: refresh.fast_every.max(1),
            slow_every: refresh.slow_every.max(1),
            cleanup_every: refresh.cleanup_every.max(1),
            metrics_interval: Duration::from_millis(refresh.metrics_interval_ms),
            metrics_yield: Duration::from_millis(refresh.metrics_yield_ms),
            log_tail: logs.tail,
            log_read_timeout: Duration::from_millis(logs.read_timeout_ms.max(1)),
            log_terminate_wait: Duration::from_millis(logs.terminate_wait_ms),
            log_retry_backoff: Duration::from_millis(logs.retry_backoff_ms),
        }
    }
}

/// Handle to the running poller tasks
pub struct Pollers {
    shutdown: ShutdownTrigger,
    refresh: RefreshTrigger,
    handles: Vec<JoinHandle<()>>,
}

impl Pollers {
    /// Spawn all pollers on the current runtime
    pub fn spawn(
        state: Arc<StateStore>,
        provider: Arc<CachedProvider>,
        settings: PollerSettings,
    ) -> Self {
        let (trigger, shutdown) = shutdown_channel();
        let refresh = RefreshTrigger::default();

        let list = ListPoller::new(state.clone(), provider.clone(), refresh.clone(), &settings);
        let metrics = MetricsPoller::new(state.clone(), provider.clone(), &settings);
        let logs = LogPoller::new(state, provider, &settings);

        let handles = vec![
            tokio::spawn(list.run(shutdown.clone())),
            tokio::spawn(metrics.run(shutdown.clone())),
            tokio::spawn(logs.run(shutdown)),
        ];
        tracing::info!("Started {} pollers", handles.len());

        Self {
            shutdown: trigger,
            refresh,
            handles,
        }
    }

    /// Handle the foreground uses to request a refetch after mutations
    pub fn refresh_trigger(&self) -> RefreshTrigger {
        self.refresh.clone()
    }

    pub fn force_refresh(&self) {
        self.refresh.request();
    }

    /// Stop all pollers, giving in-flight provider calls time to finish
    pub async fn shutdown(self) {
        self.shutdown.trigger();
        let joined = futures::future::join_all(self.handles);
        if tokio::time::timeout(SHUTDOWN_GRACE, joined).await.is_err() {
            tracing::warn!("Pollers did not stop within {:?}", SHUTDOWN_GRACE);
        } else {
            tracing::info!("Pollers stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_interrupts_sleep() {
        let (trigger, mut shutdown) = shutdown_channel();
        let sleeper = tokio::spawn(async move { shutdown.sleep(Duration::from_secs(60)).await });
        trigger.trigger();

        let stopped = tokio::time::timeout(Duration::from_secs(1), sleeper)
            .await
            .expect("sleep not interrupted")
            .unwrap();
        assert!(stopped);
    }

    #[tokio::test]
    async fn test_sleep_without_shutdown_returns_false() {
        let (_trigger, mut shutdown) = shutdown_channel();
        assert!(!shutdown.sleep(Duration::from_millis(5)).await);
    }

    #[test]
    fn test_refresh_trigger_is_consumed_once() {
        let trigger = RefreshTrigger::default();
        let foreground = trigger.clone();
        assert!(!trigger.take());
        foreground.request();
        assert!(trigger.take());
        assert!(!trigger.take());
    }

    #[test]
    fn test_settings_from_default_config() {
        let settings = PollerSettings::default();
        assert_eq!(settings.tick, Duration::from_millis(500));
        assert_eq!(settings.fast_every, 2);
        assert_eq!(settings.slow_every, 10);
        assert_eq!(settings.log_tail, 50);
    }
}
