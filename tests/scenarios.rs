//! End-to-end scenarios through the public API
//!
//! A scripted provider stands in for docker; everything above it (cache,
//! cached provider, state store, pollers, actions) is the real thing.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tdock::actions::ActionDispatcher;
use tdock::cache::TtlCache;
use tdock::notification::{NotificationManager, NotificationStatus};
use tdock::poller::{ListPoller, PollerSettings, Pollers, RefreshTrigger};
use tdock::provider::{Action, CachedProvider, LogStream, ResourceProvider};
use tdock::resource::{Container, Metrics, ResourceItem, ResourceKind, Volume};
use tdock::state::StateStore;

fn container(id: &str, name: &str, status: &str) -> ResourceItem {
    ResourceItem::Container(Container {
        id: id.to_string(),
        short_id: id.chars().take(12).collect(),
        name: name.to_string(),
        status: status.to_string(),
        image: format!("{}:latest", name),
        project: String::new(),
        metrics: Metrics::placeholder(),
        selected: false,
    })
}

fn volume(name: &str) -> ResourceItem {
    ResourceItem::Volume(Volume {
        name: name.to_string(),
        driver: "local".to_string(),
        mountpoint: format!("/var/lib/docker/volumes/{}/_data", name),
        selected: false,
    })
}

/// In-memory docker: lists per kind, removals take effect immediately
#[derive(Default)]
struct ScriptedDocker {
    lists: Mutex<HashMap<ResourceKind, Vec<ResourceItem>>>,
    list_calls: AtomicUsize,
}

impl ScriptedDocker {
    fn with(kind: ResourceKind, items: Vec<ResourceItem>) -> Self {
        let docker = Self::default();
        docker.lists.lock().unwrap().insert(kind, items);
        docker
    }
}

#[async_trait]
impl ResourceProvider for ScriptedDocker {
    async fn list_resources(&self, kind: ResourceKind) -> Result<Vec<ResourceItem>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .lists
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }

    async fn mutate(&self, kind: ResourceKind, id: &str, action: &Action) -> Result<()> {
        let mut lists = self.lists.lock().unwrap();
        let items = lists.entry(kind).or_default();
        match action {
            Action::Remove => {
                let before = items.len();
                items.retain(|item| item.identity() != id);
                if items.len() == before {
                    return Err(anyhow!("No such {}: {}", kind.noun(1), id));
                }
                Ok(())
            },
            _ => Ok(()),
        }
    }

    async fn get_metrics(&self, _kind: ResourceKind, _id: &str) -> Result<Metrics> {
        Ok(Metrics::new(12.5, 64.0))
    }

    async fn stream_logs(&self, id: &str, _tail: usize) -> Result<Box<dyn LogStream>> {
        Err(anyhow!("logs unavailable for {}", id))
    }

    async fn self_usage(&self) -> Result<String> {
        Ok("CPU: 1.0% MEM: 20.0MB".to_string())
    }
}

fn cached(docker: Arc<ScriptedDocker>) -> Arc<CachedProvider> {
    Arc::new(CachedProvider::new(docker, Arc::new(TtlCache::new())))
}

fn fast_settings() -> PollerSettings {
    PollerSettings {
        tick: Duration::from_millis(10),
        metrics_interval: Duration::from_millis(10),
        metrics_yield: Duration::from_millis(1),
        log_retry_backoff: Duration::from_millis(10),
        ..PollerSettings::default()
    }
}

#[test]
fn filter_narrows_view_but_not_collection() {
    let store = StateStore::default();
    store.replace_collection(
        ResourceKind::Containers,
        vec![
            container("c1", "web-app", "running"),
            container("c2", "db-mongo", "running"),
            container("c3", "cache-redis", "exited"),
        ],
    );

    store.set_filter_text("web");

    let snap = store.snapshot();
    let visible: Vec<&str> = snap.active_items().iter().map(|i| i.display_name()).collect();
    assert_eq!(visible, vec!["web-app"]);
    assert_eq!(snap.total(ResourceKind::Containers), 3);
    assert_eq!(store.collection(ResourceKind::Containers).len(), 3);
}

#[test]
fn paging_keeps_cursor_on_screen() {
    let store = StateStore::default();
    store.set_active_kind(ResourceKind::Volumes);
    store.replace_collection(
        ResourceKind::Volumes,
        (0..20).map(|i| volume(&format!("vol-{:02}", i))).collect(),
    );

    store.move_selection(2, 5);
    store.move_selection(2, 5);
    store.move_selection(1, 5);

    let snap = store.snapshot();
    assert_eq!(snap.selected_index, 5);
    assert_eq!(snap.scroll_offset, 1);
    assert_eq!(snap.selected_item().map(|i| i.display_name()), Some("vol-05"));
}

#[test]
fn bulk_selection_is_dropped_when_switching_tabs() {
    let store = StateStore::default();
    store.replace_collection(
        ResourceKind::Containers,
        vec![container("c1", "a", "running"), container("c2", "b", "running")],
    );
    store.select_all();
    assert_eq!(store.selected_ids().len(), 2);

    store.set_active_kind(ResourceKind::Images);
    store.set_active_kind(ResourceKind::Containers);

    assert!(!store.is_bulk_mode());
    assert!(store.selected_ids().is_empty());
}

#[test]
fn list_is_served_from_cache_until_invalidated() {
    let docker = Arc::new(ScriptedDocker::with(
        ResourceKind::Volumes,
        vec![volume("data"), volume("logs")],
    ));
    let provider = cached(docker.clone());

    tokio_test::block_on(async {
        assert_eq!(provider.list(ResourceKind::Volumes).await.len(), 2);
        assert_eq!(provider.list(ResourceKind::Volumes).await.len(), 2);
        assert_eq!(docker.list_calls.load(Ordering::SeqCst), 1);

        let outcome = provider
            .mutate(ResourceKind::Volumes, "data", &Action::Remove)
            .await;
        assert!(outcome.ok);

        let items = provider.list(ResourceKind::Volumes).await;
        assert_eq!(items.len(), 1);
        assert_eq!(docker.list_calls.load(Ordering::SeqCst), 2);
    });
}

#[tokio::test]
async fn removal_through_dispatcher_reaches_store_on_next_tick() {
    let docker = Arc::new(ScriptedDocker::with(
        ResourceKind::Containers,
        vec![container("c1", "web-app", "exited"), container("c2", "db", "running")],
    ));
    let provider = cached(docker);
    let state = Arc::new(StateStore::default());
    let refresh = RefreshTrigger::default();
    let mut poller = ListPoller::new(
        state.clone(),
        provider.clone(),
        refresh.clone(),
        &fast_settings(),
    );

    poller.step().await;
    assert_eq!(state.snapshot().total(ResourceKind::Containers), 2);

    let dispatcher = ActionDispatcher::new(provider, state.clone(), refresh, false);
    let mut notifications = NotificationManager::new();
    let outcome = dispatcher
        .run_single(
            ResourceKind::Containers,
            "c1",
            "web-app",
            Action::Remove,
            &mut notifications,
        )
        .await;
    assert!(outcome.ok);
    assert_eq!(
        notifications.notifications.front().map(|n| &n.status),
        Some(&NotificationStatus::Success)
    );

    poller.step().await;
    let names: Vec<String> = state
        .collection(ResourceKind::Containers)
        .iter()
        .map(|i| i.display_name().to_string())
        .collect();
    assert_eq!(names, vec!["db"]);
}

#[tokio::test]
async fn pollers_fill_store_and_stop_on_shutdown() {
    let docker = Arc::new(ScriptedDocker::with(
        ResourceKind::Containers,
        vec![container("c1", "web", "running")],
    ));
    let state = Arc::new(StateStore::default());
    let pollers = Pollers::spawn(state.clone(), cached(docker), fast_settings());

    let filled = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snap = state.snapshot();
            let measured = snap
                .items(ResourceKind::Containers)
                .first()
                .and_then(|item| item.metrics())
                .map(|m| m.cpu_percent.is_some())
                .unwrap_or(false);
            if measured && !snap.self_usage.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(filled.is_ok(), "pollers never populated the store");

    tokio::time::timeout(Duration::from_secs(5), pollers.shutdown())
        .await
        .expect("shutdown hung");
}
