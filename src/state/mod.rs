//! Shared state store
//!
//! Canonical in-memory state shared by the pollers (writers) and the
//! foreground (reader and writer). All fields live behind one mutex; the
//! version counter sits next to it as an atomic so the render loop can poll
//! it without taking the lock.
//!
//! Every mutator takes the lock exactly once and does its work through
//! `&mut StoreInner` helpers. Helpers call each other freely, which gives
//! the "mutators calling mutators" behaviour of a reentrant lock without
//! ever locking twice. The version is bumped while the guard is still held,
//! so a snapshot always carries the version of the state it copied.

pub mod logs;

use crate::resource::{project_indices, Metrics, ResourceItem, ResourceKind, SortMode};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub use logs::{LogBuffer, DEFAULT_MAX_LINES};

/// Log scroll offset meaning "stick to the newest line"
pub const LOGS_FOLLOW: usize = usize::MAX;

/// Placeholder shown in the log pane until a stream delivers a line
pub const LOADING_PLACEHOLDER: &str = "Loading...";

/// Which pane receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusedPane {
    #[default]
    List,
    Details,
}

struct StoreInner {
    collections: [Vec<ResourceItem>; 5],
    active_kind: ResourceKind,
    selected_index: usize,
    scroll_offset: usize,
    filter_text: String,
    is_filtering: bool,
    sort_mode: SortMode,
    bulk_mode: bool,
    focused_pane: FocusedPane,
    logs: LogBuffer,
    logs_scroll_offset: usize,
    message: Option<String>,
    last_error: Option<(String, Instant)>,
    update_available: bool,
    self_usage: String,
}

impl StoreInner {
    fn new(max_log_lines: usize) -> Self {
        let mut logs = LogBuffer::new(max_log_lines);
        logs.reset(LOADING_PLACEHOLDER);
        Self {
            collections: Default::default(),
            active_kind: ResourceKind::Containers,
            selected_index: 0,
            scroll_offset: 0,
            filter_text: String::new(),
            is_filtering: false,
            sort_mode: SortMode::default(),
            bulk_mode: false,
            focused_pane: FocusedPane::default(),
            logs,
            logs_scroll_offset: LOGS_FOLLOW,
            message: None,
            last_error: None,
            update_available: false,
            self_usage: String::new(),
        }
    }

    fn collection(&self, kind: ResourceKind) -> &[ResourceItem] {
        &self.collections[kind.index()]
    }

    /// Indices of the visible rows of `kind`, in display order
    fn visible(&self, kind: ResourceKind) -> Vec<usize> {
        project_indices(self.collection(kind), kind, self.sort_mode, &self.filter_text)
    }

    fn projection(&self, kind: ResourceKind) -> Vec<ResourceItem> {
        let items = self.collection(kind);
        self.visible(kind)
            .into_iter()
            .map(|idx| items[idx].clone())
            .collect()
    }

    /// Index into the active collection of the row under the cursor
    fn cursor_item(&self) -> Option<usize> {
        self.visible(self.active_kind).get(self.selected_index).copied()
    }

    /// Keep the cursor inside the active projection. Returns true on change.
    fn clamp_selection(&mut self) -> bool {
        let len = self.visible(self.active_kind).len();
        let index = self.selected_index.min(len.saturating_sub(1));
        let offset = self.scroll_offset.min(index);
        let changed = index != self.selected_index || offset != self.scroll_offset;
        self.selected_index = index;
        self.scroll_offset = offset;
        changed
    }

    fn reset_logs(&mut self, placeholder: &str) -> bool {
        if self.logs.shows_placeholder(placeholder) && self.logs_scroll_offset == LOGS_FOLLOW {
            return false;
        }
        self.logs.reset(placeholder);
        self.logs_scroll_offset = LOGS_FOLLOW;
        true
    }

    /// Set the `selected` flag on every visible row of the active kind
    fn set_visible_selected(&mut self, selected: bool) -> bool {
        let kind = self.active_kind;
        let visible = self.visible(kind);
        let items = &mut self.collections[kind.index()];
        let mut changed = false;
        for idx in visible {
            if items[idx].is_selected() != selected {
                items[idx].set_selected(selected);
                changed = true;
            }
        }
        changed
    }
}

/// Thread-safe, versioned application state
pub struct StateStore {
    inner: Mutex<StoreInner>,
    version: AtomicU64,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINES)
    }
}

impl StateStore {
    pub fn new(max_log_lines: usize) -> Self {
        Self {
            inner: Mutex::new(StoreInner::new(max_log_lines)),
            version: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` under the lock and bump the version if it reports a change
    fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut StoreInner) -> bool,
    {
        let mut inner = self.lock();
        let changed = f(&mut inner);
        if changed {
            self.version.fetch_add(1, Ordering::AcqRel);
        }
        drop(inner);
        changed
    }

    /// Current version. Never decreases.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Independent copy of everything the renderer needs
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.lock();
        let views = ResourceKind::ALL.map(|kind| inner.projection(kind));
        let totals = ResourceKind::ALL.map(|kind| inner.collection(kind).len());

        Snapshot {
            version: self.version(),
            active_kind: inner.active_kind,
            views,
            totals,
            selected_index: inner.selected_index,
            scroll_offset: inner.scroll_offset,
            filter_text: inner.filter_text.clone(),
            is_filtering: inner.is_filtering,
            sort_mode: inner.sort_mode,
            bulk_mode: inner.bulk_mode,
            focused_pane: inner.focused_pane,
            logs: inner.logs.to_vec(),
            logs_scroll_offset: inner.logs_scroll_offset,
            message: inner.message.clone(),
            last_error: inner.last_error.as_ref().map(|(msg, _)| msg.clone()),
            update_available: inner.update_available,
            self_usage: inner.self_usage.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Poller-facing mutators
    // ------------------------------------------------------------------

    /// Replace the collection of `kind`, carrying selection and metrics over
    /// from the prior items with the same identity. Always one version bump.
    pub fn replace_collection(&self, kind: ResourceKind, items: Vec<ResourceItem>) {
        self.update(|inner| {
            let prior: HashMap<&str, &ResourceItem> = inner
                .collection(kind)
                .iter()
                .map(|item| (item.identity(), item))
                .collect();

            let merged: Vec<ResourceItem> = items
                .into_iter()
                .filter(|item| item.kind() == kind)
                .map(|mut item| {
                    if let Some(old) = prior.get(item.identity()) {
                        item.inherit_from(old);
                    }
                    item
                })
                .collect();

            tracing::debug!("replaced {} with {} items", kind, merged.len());
            inner.collections[kind.index()] = merged;
            if kind == inner.active_kind {
                inner.clamp_selection();
            }
            true
        });
    }

    /// Update the metrics of one item. Unknown ids are ignored.
    pub fn update_item_metric(&self, kind: ResourceKind, id: &str, metrics: Metrics) {
        self.update(|inner| {
            inner.collections[kind.index()]
                .iter_mut()
                .find(|item| item.identity() == id)
                .map(|item| item.set_metrics(metrics))
                .unwrap_or(false)
        });
    }

    pub fn reset_logs(&self, placeholder: &str) {
        self.update(|inner| inner.reset_logs(placeholder));
    }

    /// Replace the log buffer with the output of a re-attached stream
    pub fn replace_logs(&self, lines: Vec<String>) {
        self.update(|inner| inner.logs.replace(lines));
    }

    pub fn append_logs(&self, lines: Vec<String>) {
        if lines.is_empty() {
            return;
        }
        self.update(|inner| {
            inner.logs.extend(lines);
            true
        });
    }

    pub fn set_update_available(&self, available: bool) {
        self.update(|inner| {
            let changed = inner.update_available != available;
            inner.update_available = available;
            changed
        });
    }

    pub fn set_self_usage(&self, usage: String) {
        self.update(|inner| {
            if inner.self_usage == usage {
                return false;
            }
            inner.self_usage = usage;
            true
        });
    }

    // ------------------------------------------------------------------
    // Foreground mutators
    // ------------------------------------------------------------------

    /// Switch tabs. Resets cursor, filter, bulk mode and the log pane, and
    /// drops every bulk selection.
    pub fn set_active_kind(&self, kind: ResourceKind) {
        self.update(|inner| {
            if inner.active_kind == kind {
                return false;
            }
            inner.active_kind = kind;
            inner.selected_index = 0;
            inner.scroll_offset = 0;
            inner.filter_text.clear();
            inner.is_filtering = false;
            inner.bulk_mode = false;
            inner.focused_pane = FocusedPane::List;
            inner.message = None;
            for items in inner.collections.iter_mut() {
                items.iter_mut().for_each(|item| item.set_selected(false));
            }
            inner.reset_logs(LOADING_PLACEHOLDER);
            true
        });
    }

    /// Move the cursor by `delta` rows, scrolling so it stays on a page of
    /// `page_height` rows.
    pub fn move_selection(&self, delta: isize, page_height: usize) {
        self.update(|inner| {
            let len = inner.visible(inner.active_kind).len();
            if len == 0 {
                let changed = inner.selected_index != 0 || inner.scroll_offset != 0;
                inner.selected_index = 0;
                inner.scroll_offset = 0;
                return changed;
            }

            let page = page_height.max(1);
            let index = (inner.selected_index as isize)
                .saturating_add(delta)
                .clamp(0, len as isize - 1) as usize;
            let mut offset = inner.scroll_offset;
            if index < offset {
                offset = index;
            } else if index >= offset + page {
                offset = index + 1 - page;
            }

            if index == inner.selected_index && offset == inner.scroll_offset {
                return false;
            }
            if index != inner.selected_index && inner.active_kind.has_logs() {
                inner.reset_logs(LOADING_PLACEHOLDER);
            }
            inner.selected_index = index;
            inner.scroll_offset = offset;
            true
        });
    }

    pub fn set_filter_text(&self, text: &str) {
        self.update(|inner| {
            if inner.filter_text == text {
                return false;
            }
            inner.filter_text = text.to_string();
            inner.clamp_selection();
            true
        });
    }

    /// Whether the filter input line is active
    pub fn set_filtering(&self, active: bool) {
        self.update(|inner| {
            let changed = inner.is_filtering != active;
            inner.is_filtering = active;
            changed
        });
    }

    pub fn cycle_sort_mode(&self) {
        self.update(|inner| {
            inner.sort_mode = inner.sort_mode.next();
            inner.clamp_selection();
            true
        });
    }

    pub fn toggle_bulk_mode(&self) {
        self.update(|inner| {
            inner.bulk_mode = !inner.bulk_mode;
            true
        });
    }

    /// Flip the `selected` flag of the row under the cursor (bulk mode only)
    pub fn toggle_item_selection(&self) {
        self.update(|inner| {
            if !inner.bulk_mode {
                return false;
            }
            let Some(idx) = inner.cursor_item() else {
                return false;
            };
            let item = &mut inner.collections[inner.active_kind.index()][idx];
            let selected = !item.is_selected();
            item.set_selected(selected);
            true
        });
    }

    /// Select every visible row of the active kind and enter bulk mode
    pub fn select_all(&self) {
        self.update(|inner| {
            let entered = !inner.bulk_mode;
            inner.bulk_mode = true;
            inner.set_visible_selected(true) || entered
        });
    }

    /// Deselect every visible row of the active kind
    pub fn select_none(&self) {
        self.update(|inner| inner.set_visible_selected(false));
    }

    pub fn toggle_focus(&self) {
        self.update(|inner| {
            inner.focused_pane = match inner.focused_pane {
                FocusedPane::List => FocusedPane::Details,
                FocusedPane::Details => FocusedPane::List,
            };
            true
        });
    }

    /// Scroll the log pane. The offset is clamped to
    /// `[0, len - page_height + 1]`.
    pub fn scroll_logs(&self, delta: isize, page_height: usize) {
        self.update(|inner| {
            if inner.logs.is_empty() {
                return false;
            }
            let max_offset = (inner.logs.len() + 1).saturating_sub(page_height);
            let current = inner.logs_scroll_offset.min(max_offset);
            let offset = (current as isize)
                .saturating_add(delta)
                .clamp(0, max_offset as isize) as usize;
            if offset == inner.logs_scroll_offset {
                return false;
            }
            inner.logs_scroll_offset = offset;
            true
        });
    }

    pub fn set_message(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|inner| {
            if inner.message.as_deref() == Some(message.as_str()) {
                return false;
            }
            inner.message = Some(message);
            true
        });
    }

    pub fn clear_message(&self) {
        self.update(|inner| inner.message.take().is_some());
    }

    /// Show a transient error; see [`StateStore::clear_expired_error`]
    pub fn set_error(&self, error: impl Into<String>) {
        let error = error.into();
        tracing::debug!("state error: {}", error);
        self.update(|inner| {
            inner.last_error = Some((error, Instant::now()));
            true
        });
    }

    pub fn clear_error(&self) {
        self.update(|inner| inner.last_error.take().is_some());
    }

    /// Drop the error once it has been shown for `max_age`
    pub fn clear_expired_error(&self, max_age: Duration) -> bool {
        self.update(|inner| {
            let expired = matches!(&inner.last_error, Some((_, at)) if at.elapsed() >= max_age);
            if expired {
                inner.last_error = None;
            }
            expired
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn active_kind(&self) -> ResourceKind {
        self.lock().active_kind
    }

    pub fn is_bulk_mode(&self) -> bool {
        self.lock().bulk_mode
    }

    /// Identity of the row under the cursor
    pub fn selected_item_id(&self) -> Option<String> {
        let inner = self.lock();
        inner
            .cursor_item()
            .map(|idx| inner.collection(inner.active_kind)[idx].identity().to_string())
    }

    /// Identities of the visible rows flagged for bulk actions
    pub fn selected_ids(&self) -> Vec<String> {
        let inner = self.lock();
        let items = inner.collection(inner.active_kind);
        inner
            .visible(inner.active_kind)
            .into_iter()
            .filter(|&idx| items[idx].is_selected())
            .map(|idx| items[idx].identity().to_string())
            .collect()
    }

    /// Every item of `kind` in provider order, ignoring the filter
    pub fn collection(&self, kind: ResourceKind) -> Vec<ResourceItem> {
        self.lock().collection(kind).to_vec()
    }

    /// Identities of every running item of `kind`, filtered or not
    pub fn active_item_ids(&self, kind: ResourceKind) -> Vec<String> {
        self.lock()
            .collection(kind)
            .iter()
            .filter(|item| item.is_active())
            .map(|item| item.identity().to_string())
            .collect()
    }

    /// Container whose logs should be followed, if a container tab row is
    /// under the cursor
    pub fn log_target(&self) -> Option<String> {
        let inner = self.lock();
        if !inner.active_kind.has_logs() {
            return None;
        }
        inner
            .cursor_item()
            .map(|idx| inner.collection(inner.active_kind)[idx].identity().to_string())
    }
}

/// Immutable view of the state at one version
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub version: u64,
    pub active_kind: ResourceKind,
    views: [Vec<ResourceItem>; 5],
    totals: [usize; 5],
    pub selected_index: usize,
    pub scroll_offset: usize,
    pub filter_text: String,
    pub is_filtering: bool,
    pub sort_mode: SortMode,
    pub bulk_mode: bool,
    pub focused_pane: FocusedPane,
    pub logs: Vec<String>,
    pub logs_scroll_offset: usize,
    pub message: Option<String>,
    pub last_error: Option<String>,
    pub update_available: bool,
    pub self_usage: String,
}

impl Snapshot {
    /// Filtered and sorted rows of `kind`
    pub fn items(&self, kind: ResourceKind) -> &[ResourceItem] {
        &self.views[kind.index()]
    }

    /// Number of rows of `kind` before filtering
    pub fn total(&self, kind: ResourceKind) -> usize {
        self.totals[kind.index()]
    }

    pub fn active_items(&self) -> &[ResourceItem] {
        self.items(self.active_kind)
    }

    pub fn selected_item(&self) -> Option<&ResourceItem> {
        self.active_items().get(self.selected_index)
    }

    pub fn selected_count(&self) -> usize {
        self.active_items().iter().filter(|i| i.is_selected()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::tests::{container, volume};

    fn store_with(kind: ResourceKind, items: Vec<ResourceItem>) -> StateStore {
        let store = StateStore::default();
        store.set_active_kind(kind);
        store.replace_collection(kind, items);
        store
    }

    fn numbered_volumes(n: usize) -> Vec<ResourceItem> {
        (0..n).map(|i| volume(&format!("vol-{:02}", i))).collect()
    }

    #[test]
    fn test_replace_merges_metrics_and_selection() {
        let store = StateStore::default();
        store.replace_collection(
            ResourceKind::Containers,
            vec![container("c1", "web", "running"), container("c2", "db", "running")],
        );
        store.update_item_metric(ResourceKind::Containers, "c1", Metrics::new(5.0, 50.0));
        store.toggle_bulk_mode();
        store.toggle_item_selection(); // cursor on "db"

        store.replace_collection(
            ResourceKind::Containers,
            vec![container("c1", "web", "running"), container("c2", "db", "exited")],
        );

        let snap = store.snapshot();
        let items = snap.items(ResourceKind::Containers);
        assert_eq!(items[0].display_name(), "db");
        assert!(items[0].is_selected());
        assert_eq!(items[0].status(), Some("exited"));
        assert_eq!(items[1].metrics(), Some(&Metrics::new(5.0, 50.0)));
    }

    #[test]
    fn test_replace_bumps_once() {
        let store = StateStore::default();
        let before = store.version();
        store.replace_collection(ResourceKind::Volumes, numbered_volumes(10));
        assert_eq!(store.version(), before + 1);
    }

    #[test]
    fn test_update_metric_unknown_id_is_noop() {
        let store = store_with(ResourceKind::Containers, vec![container("c1", "web", "running")]);
        let before = store.version();
        store.update_item_metric(ResourceKind::Containers, "missing", Metrics::new(1.0, 1.0));
        assert_eq!(store.version(), before);

        store.update_item_metric(ResourceKind::Containers, "c1", Metrics::new(1.0, 1.0));
        assert_eq!(store.version(), before + 1);
        store.update_item_metric(ResourceKind::Containers, "c1", Metrics::new(1.0, 1.0));
        assert_eq!(store.version(), before + 1);
    }

    #[test]
    fn test_move_selection_at_top_is_noop() {
        let store = store_with(ResourceKind::Volumes, numbered_volumes(3));
        let before = store.version();
        store.move_selection(-1, 5);
        assert_eq!(store.version(), before);
    }

    #[test]
    fn test_move_selection_scrolls_page() {
        let store = store_with(ResourceKind::Volumes, numbered_volumes(20));
        store.move_selection(2, 5);
        store.move_selection(2, 5);
        store.move_selection(1, 5);

        let snap = store.snapshot();
        assert_eq!(snap.selected_index, 5);
        assert_eq!(snap.scroll_offset, 1);

        store.move_selection(-100, 5);
        let snap = store.snapshot();
        assert_eq!(snap.selected_index, 0);
        assert_eq!(snap.scroll_offset, 0);
    }

    #[test]
    fn test_move_selection_resets_container_logs() {
        let store = store_with(
            ResourceKind::Containers,
            vec![container("a", "a", "running"), container("b", "b", "running")],
        );
        store.append_logs(vec!["from a".to_string()]);
        store.move_selection(1, 10);
        assert_eq!(store.snapshot().logs, vec![LOADING_PLACEHOLDER]);
        assert_eq!(store.log_target().as_deref(), Some("b"));
    }

    #[test]
    fn test_repeated_placeholder_and_message_do_not_bump() {
        let store = StateStore::default();
        store.set_message("x");
        let before = store.version();

        store.set_message("x");
        store.reset_logs(LOADING_PLACEHOLDER);
        assert_eq!(store.version(), before);

        store.set_message("y");
        assert_eq!(store.version(), before + 1);
        store.append_logs(vec!["line".to_string()]);
        store.reset_logs(LOADING_PLACEHOLDER);
        assert_eq!(store.version(), before + 3);
    }

    #[test]
    fn test_replace_logs_bumps_only_on_change() {
        let store = StateStore::default();
        store.replace_logs(vec!["a1".to_string()]);
        let before = store.version();
        store.replace_logs(vec!["a1".to_string()]);
        assert_eq!(store.version(), before);
        assert_eq!(store.snapshot().logs, vec!["a1"]);
    }

    #[test]
    fn test_filter_clamps_selection() {
        let store = store_with(ResourceKind::Volumes, numbered_volumes(10));
        store.move_selection(8, 3);
        store.set_filter_text("vol-0");
        let snap = store.snapshot();
        assert_eq!(snap.items(ResourceKind::Volumes).len(), 10);

        store.set_filter_text("vol-01");
        let snap = store.snapshot();
        assert_eq!(snap.items(ResourceKind::Volumes).len(), 1);
        assert_eq!(snap.selected_index, 0);
        assert_eq!(snap.scroll_offset, 0);
        assert_eq!(snap.total(ResourceKind::Volumes), 10);
    }

    #[test]
    fn test_set_same_filter_does_not_bump() {
        let store = store_with(ResourceKind::Volumes, numbered_volumes(2));
        store.set_filter_text("vol");
        let before = store.version();
        store.set_filter_text("vol");
        assert_eq!(store.version(), before);
    }

    #[test]
    fn test_set_active_kind_resets_cursor_and_bulk() {
        let store = store_with(ResourceKind::Volumes, numbered_volumes(5));
        store.move_selection(3, 10);
        store.set_filter_text("vol");
        store.select_all();
        assert!(store.is_bulk_mode());

        store.set_active_kind(ResourceKind::Containers);
        let snap = store.snapshot();
        assert_eq!(snap.selected_index, 0);
        assert_eq!(snap.filter_text, "");
        assert!(!snap.bulk_mode);
        assert_eq!(snap.logs, vec![LOADING_PLACEHOLDER]);

        store.set_active_kind(ResourceKind::Volumes);
        assert!(store.selected_ids().is_empty());
    }

    #[test]
    fn test_set_active_kind_same_kind_is_noop() {
        let store = StateStore::default();
        let before = store.version();
        store.set_active_kind(ResourceKind::Containers);
        assert_eq!(store.version(), before);
    }

    #[test]
    fn test_select_all_only_touches_visible_rows() {
        let store = store_with(
            ResourceKind::Volumes,
            vec![volume("data-a"), volume("data-b"), volume("logs")],
        );
        store.set_filter_text("data");
        store.select_all();
        assert_eq!(store.selected_ids(), vec!["data-a", "data-b"]);

        store.set_filter_text("");
        assert_eq!(store.selected_ids(), vec!["data-a", "data-b"]);

        store.select_none();
        assert!(store.selected_ids().is_empty());
    }

    #[test]
    fn test_toggle_item_selection_requires_bulk_mode() {
        let store = store_with(ResourceKind::Volumes, numbered_volumes(2));
        store.toggle_item_selection();
        assert!(store.selected_ids().is_empty());

        store.toggle_bulk_mode();
        store.toggle_item_selection();
        assert_eq!(store.selected_ids(), vec!["vol-00"]);
        store.toggle_item_selection();
        assert!(store.selected_ids().is_empty());
    }

    #[test]
    fn test_scroll_logs_clamps() {
        let store = StateStore::default();
        store.append_logs((0..10).map(|i| i.to_string()).collect());

        store.scroll_logs(-1, 4);
        assert_eq!(store.snapshot().logs_scroll_offset, 6);
        store.scroll_logs(-100, 4);
        assert_eq!(store.snapshot().logs_scroll_offset, 0);
        store.scroll_logs(100, 4);
        assert_eq!(store.snapshot().logs_scroll_offset, 7);
    }

    #[test]
    fn test_logs_capped_by_store_size() {
        let store = StateStore::new(3);
        store.append_logs((0..5).map(|i| i.to_string()).collect());
        assert_eq!(store.snapshot().logs, vec!["2", "3", "4"]);
    }

    #[test]
    fn test_active_item_ids_ignores_filter() {
        let store = store_with(
            ResourceKind::Containers,
            vec![
                container("1", "web", "running"),
                container("2", "db", "running"),
                container("3", "old", "exited"),
            ],
        );
        store.set_filter_text("web");
        let mut ids = store.active_item_ids(ResourceKind::Containers);
        ids.sort();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_error_expiry() {
        let store = StateStore::default();
        store.set_error("boom");
        assert!(!store.clear_expired_error(Duration::from_secs(60)));
        assert_eq!(store.snapshot().last_error.as_deref(), Some("boom"));
        assert!(store.clear_expired_error(Duration::ZERO));
        assert_eq!(store.snapshot().last_error, None);
    }

    #[test]
    fn test_log_target_only_for_containers() {
        let store = store_with(ResourceKind::Volumes, numbered_volumes(1));
        assert_eq!(store.log_target(), None);
        assert_eq!(store.selected_item_id().as_deref(), Some("vol-00"));
    }

    #[test]
    fn test_snapshot_version_matches_store() {
        let store = StateStore::default();
        store.set_message("hello");
        let snap = store.snapshot();
        assert_eq!(snap.version, store.version());
        assert_eq!(snap.message.as_deref(), Some("hello"));
    }
}
