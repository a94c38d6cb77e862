//! Application State
//!
//! Foreground state of the dashboard. Everything shared with the pollers
//! lives in the [`StateStore`]; this holds what only the terminal front end
//! needs: the current mode, dialogs, the notification history and the last
//! snapshot that was drawn.

use crate::shell::{self, ShellResult};
use std::sync::Arc;
use std::time::Duration;
use tdock::actions::ActionDispatcher;
use tdock::config::Config;
use tdock::notification::{DetailLevel, NotificationManager};
use tdock::poller::RefreshTrigger;
use tdock::provider::{Action, CachedProvider};
use tdock::resource::{ResourceItem, ResourceKind};
use tdock::state::{FocusedPane, Snapshot, StateStore};
use tdock::stats::DashboardStats;

/// Application modes
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,        // Viewing list
    Help,          // ? help popup
    Confirm,       // Confirmation dialog
    Warning,       // Warning/info dialog (OK only)
    Rename,        // New container name input
    Stats,         // Dashboard statistics
    Notifications, // Notifications history panel
}

/// What a confirmed action runs on
#[derive(Debug, Clone, PartialEq)]
pub enum ActionTarget {
    Item { id: String, label: String },
    /// Every selected row of the active kind
    Selection,
    /// Docker-wide (prune)
    Global,
}

/// Pending action that requires confirmation
#[derive(Debug, Clone)]
pub struct PendingAction {
    pub action: Action,
    pub kind: ResourceKind,
    pub target: ActionTarget,
    pub message: String,
    /// Names of the rows the action touches, shown in the dialog
    pub targets: Vec<String>,
    pub destructive: bool,
    pub selected_yes: bool,
}

/// Main application state
pub struct App {
    pub state: Arc<StateStore>,
    pub provider: Arc<CachedProvider>,
    pub dispatcher: ActionDispatcher,
    pub refresh: RefreshTrigger,

    // Last drawn state
    pub snapshot: Snapshot,
    rendered_version: Option<u64>,
    pub dirty: bool,

    pub mode: Mode,
    pub pending_action: Option<PendingAction>,
    pub warning_message: Option<String>,
    pub rename_text: String,
    pub rename_target: Option<String>,

    // Notifications
    pub notification_manager: NotificationManager,
    pub notifications_selected: usize,

    pub stats: Option<DashboardStats>,

    // Updated during render from the terminal size
    pub list_page_height: usize,
    pub logs_page_height: usize,

    pub config: Config,
    pub readonly: bool,
}

impl App {
    pub fn new(
        state: Arc<StateStore>,
        provider: Arc<CachedProvider>,
        refresh: RefreshTrigger,
        config: Config,
        readonly: bool,
    ) -> Self {
        let dispatcher =
            ActionDispatcher::new(provider.clone(), state.clone(), refresh.clone(), readonly);
        let notification_manager = NotificationManager::new()
            .with_detail_level(DetailLevel::from_str(&config.ui.notification_detail));
        let snapshot = state.snapshot();

        Self {
            state,
            provider,
            dispatcher,
            refresh,
            snapshot,
            rendered_version: None,
            dirty: true,
            mode: Mode::Normal,
            pending_action: None,
            warning_message: None,
            rename_text: String::new(),
            rename_target: None,
            notification_manager,
            notifications_selected: 0,
            stats: None,
            list_page_height: 10,
            logs_page_height: 10,
            config,
            readonly,
        }
    }

    /// Whether the screen is stale: the store moved on, a key was handled,
    /// or a toast is on screen and may have expired.
    pub fn needs_redraw(&self) -> bool {
        self.dirty
            || self.rendered_version != Some(self.state.version())
            || self.notification_manager.current_toast().is_some()
    }

    /// Take a fresh snapshot for the next frame
    pub fn sync(&mut self) {
        self.snapshot = self.state.snapshot();
        self.rendered_version = Some(self.snapshot.version);
        if self.mode == Mode::Stats {
            self.stats = Some(self.collect_stats());
        }
        self.dirty = false;
    }

    pub fn error_display(&self) -> Duration {
        self.config.ui.error_display()
    }

    pub fn selected_item(&self) -> Option<&ResourceItem> {
        self.snapshot.selected_item()
    }

    // =====================================================================
    // Navigation
    // =====================================================================

    pub fn switch_kind(&mut self, kind: ResourceKind) {
        self.state.set_active_kind(kind);
    }

    pub fn next_kind(&mut self) {
        self.switch_kind(self.state.active_kind().next());
    }

    pub fn previous_kind(&mut self) {
        self.switch_kind(self.state.active_kind().previous());
    }

    /// Move the cursor, or scroll the logs when the details pane has focus
    pub fn move_by(&mut self, delta: isize) {
        if self.snapshot.focused_pane == FocusedPane::Details {
            self.state.scroll_logs(delta, self.logs_page_height);
        } else {
            self.state.move_selection(delta, self.list_page_height);
        }
    }

    pub fn page_down(&mut self) {
        let page = self.current_page_height() as isize;
        self.move_by(page);
    }

    pub fn page_up(&mut self) {
        let page = self.current_page_height() as isize;
        self.move_by(-page);
    }

    pub fn go_to_top(&mut self) {
        self.move_by(isize::MIN);
    }

    pub fn go_to_bottom(&mut self) {
        self.move_by(isize::MAX);
    }

    fn current_page_height(&self) -> usize {
        match self.snapshot.focused_pane {
            FocusedPane::List => self.list_page_height,
            FocusedPane::Details => self.logs_page_height,
        }
    }

    // =====================================================================
    // Filtering
    // =====================================================================

    pub fn start_filter(&mut self) {
        self.state.set_filtering(true);
    }

    pub fn push_filter_char(&mut self, c: char) {
        let mut text = self.snapshot.filter_text.clone();
        text.push(c);
        self.state.set_filter_text(&text);
    }

    pub fn pop_filter_char(&mut self) {
        let mut text = self.snapshot.filter_text.clone();
        text.pop();
        self.state.set_filter_text(&text);
    }

    pub fn clear_filter(&mut self) {
        self.state.set_filter_text("");
        self.state.set_filtering(false);
    }

    // =====================================================================
    // Modes
    // =====================================================================

    pub fn enter_help_mode(&mut self) {
        self.mode = Mode::Help;
    }

    pub fn enter_stats_mode(&mut self) {
        self.stats = Some(self.collect_stats());
        self.mode = Mode::Stats;
    }

    pub fn enter_notifications_mode(&mut self) {
        self.notifications_selected = 0;
        self.mode = Mode::Notifications;
    }

    pub fn enter_confirm_mode(&mut self, pending: PendingAction) {
        self.pending_action = Some(pending);
        self.mode = Mode::Confirm;
    }

    pub fn show_warning(&mut self, message: &str) {
        self.warning_message = Some(message.to_string());
        self.mode = Mode::Warning;
    }

    pub fn exit_mode(&mut self) {
        self.mode = Mode::Normal;
        self.pending_action = None;
        self.rename_target = None;
        self.rename_text.clear();
    }

    fn collect_stats(&self) -> DashboardStats {
        DashboardStats::collect(&self.state, Some(self.provider.cache_stats()))
    }

    // =====================================================================
    // Actions
    // =====================================================================

    /// Entry point for action keys. Runs on the bulk selection in bulk
    /// mode, otherwise on the row under the cursor. Destructive actions go
    /// through the confirmation dialog first.
    pub async fn request_action(&mut self, action: Action) {
        if self.readonly {
            self.show_warning(tdock::actions::READONLY_WARNING);
            return;
        }

        let kind = self.snapshot.active_kind;
        let target = if action == Action::Prune {
            ActionTarget::Global
        } else if self.snapshot.bulk_mode {
            if !action.supports_bulk(kind) {
                return;
            }
            ActionTarget::Selection
        } else {
            if !action.applies_to(kind) {
                return;
            }
            let Some(item) = self.selected_item() else {
                return;
            };
            ActionTarget::Item {
                id: item.identity().to_string(),
                label: item.display_name().to_string(),
            }
        };

        if action.is_destructive() {
            let message = confirm_message(&action, kind, &target, self.snapshot.selected_count());
            let targets = match &target {
                ActionTarget::Item { label, .. } => vec![label.clone()],
                ActionTarget::Selection => self
                    .snapshot
                    .active_items()
                    .iter()
                    .filter(|item| item.is_selected())
                    .map(|item| item.display_name().to_string())
                    .collect(),
                ActionTarget::Global => Vec::new(),
            };
            self.enter_confirm_mode(PendingAction {
                action,
                kind,
                target,
                message,
                targets,
                destructive: true,
                selected_yes: false,
            });
        } else {
            self.run_action(action, kind, target).await;
        }
    }

    /// Run the pending action if the dialog was answered yes
    pub async fn confirm_pending(&mut self, accepted: bool) {
        if let Some(pending) = self.pending_action.take() {
            if accepted {
                self.run_action(pending.action, pending.kind, pending.target)
                    .await;
            }
        }
        self.exit_mode();
    }

    async fn run_action(&mut self, action: Action, kind: ResourceKind, target: ActionTarget) {
        match target {
            ActionTarget::Item { id, label } => {
                self.dispatcher
                    .run_single(kind, &id, &label, action, &mut self.notification_manager)
                    .await;
            },
            ActionTarget::Selection => {
                self.dispatcher
                    .run_bulk(action, &mut self.notification_manager)
                    .await;
            },
            ActionTarget::Global => {
                self.dispatcher
                    .run_prune(&mut self.notification_manager)
                    .await;
            },
        }
    }

    /// Pause a running container or compose project, unpause a paused one
    pub async fn toggle_pause(&mut self) {
        let paused = self
            .selected_item()
            .and_then(|item| item.status())
            .map(|status| status == "paused")
            .unwrap_or(false);
        let action = if paused && self.snapshot.active_kind == ResourceKind::Containers {
            Action::Unpause
        } else {
            Action::Pause
        };
        self.request_action(action).await;
    }

    pub fn start_rename(&mut self) {
        if self.readonly {
            self.show_warning(tdock::actions::READONLY_WARNING);
            return;
        }
        if self.snapshot.active_kind != ResourceKind::Containers || self.snapshot.bulk_mode {
            return;
        }
        let Some((id, name)) = self
            .selected_item()
            .map(|item| (item.identity().to_string(), item.display_name().to_string()))
        else {
            return;
        };
        self.rename_target = Some(id);
        self.rename_text = name;
        self.mode = Mode::Rename;
    }

    pub async fn submit_rename(&mut self) {
        let new_name = self.rename_text.trim().to_string();
        if let Some(id) = self.rename_target.take() {
            if !new_name.is_empty() {
                self.dispatcher
                    .run_single(
                        ResourceKind::Containers,
                        &id,
                        &new_name,
                        Action::Rename(new_name.clone()),
                        &mut self.notification_manager,
                    )
                    .await;
            }
        }
        self.exit_mode();
    }

    pub fn force_refresh(&mut self) {
        self.provider.cache().invalidate(None);
        self.refresh.request();
        self.state.set_message("Refreshing...");
    }

    // =====================================================================
    // Shell
    // =====================================================================

    /// Open a shell inside the container under the cursor
    pub fn open_shell(&mut self) {
        if self.snapshot.active_kind != ResourceKind::Containers {
            return;
        }
        let Some(id) = self.selected_item().map(|i| i.identity().to_string()) else {
            return;
        };
        let docker = self.config.docker.binary.clone();
        let result =
            shell::execute_with_terminal_handling(false, || shell::exec_shell(&docker, &id));
        self.report_shell("Shell", result);
    }

    /// Show the inspect output of the row under the cursor
    pub fn inspect_selected(&mut self) {
        let kind = self.snapshot.active_kind;
        let Some(id) = self.selected_item().map(|i| i.identity().to_string()) else {
            return;
        };
        let docker = self.config.docker.binary.clone();
        let result =
            shell::execute_with_terminal_handling(false, || shell::inspect(&docker, kind, &id));
        self.report_shell("Inspect", result);
    }

    fn report_shell(&mut self, what: &str, result: anyhow::Result<ShellResult>) {
        match result {
            Ok(ShellResult::Success) => {
                tracing::info!("{} session completed successfully", what);
            },
            Ok(ShellResult::Failed(code)) => {
                self.state
                    .set_error(format!("{} exited with code {}", what, code));
            },
            Ok(ShellResult::Error(msg)) => {
                self.state.set_error(msg);
            },
            Err(e) => {
                self.state.set_error(format!("{} error: {}", what, e));
            },
        }
        self.dirty = true;
    }

    pub fn clear_notifications(&mut self) {
        self.notification_manager.clear();
        self.notifications_selected = 0;
    }
}

fn confirm_message(
    action: &Action,
    kind: ResourceKind,
    target: &ActionTarget,
    selected: usize,
) -> String {
    match target {
        ActionTarget::Item { label, .. } => {
            format!("{} {} '{}'?", action, kind.noun(1), label)
        },
        ActionTarget::Selection => format!("{} {} {}?", action, selected, kind.noun(selected)),
        ActionTarget::Global => {
            "Prune all unused containers, images, volumes and networks?".to_string()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use tdock::cache::TtlCache;
    use tdock::provider::{LogStream, ResourceProvider};
    use tdock::resource::{Container, Metrics};

    /// Provider that is never reached by the paths under test
    struct Offline;

    #[async_trait]
    impl ResourceProvider for Offline {
        async fn list_resources(&self, _kind: ResourceKind) -> Result<Vec<ResourceItem>> {
            Ok(Vec::new())
        }

        async fn mutate(&self, _kind: ResourceKind, id: &str, _action: &Action) -> Result<()> {
            Err(anyhow!("offline: {}", id))
        }

        async fn get_metrics(&self, _kind: ResourceKind, id: &str) -> Result<Metrics> {
            Err(anyhow!("offline: {}", id))
        }

        async fn stream_logs(&self, id: &str, _tail: usize) -> Result<Box<dyn LogStream>> {
            Err(anyhow!("offline: {}", id))
        }

        async fn self_usage(&self) -> Result<String> {
            Ok(String::new())
        }
    }

    fn container(id: &str, name: &str) -> ResourceItem {
        ResourceItem::Container(Container {
            id: id.to_string(),
            short_id: id.to_string(),
            name: name.to_string(),
            status: "running".to_string(),
            image: "nginx:latest".to_string(),
            project: String::new(),
            metrics: Metrics::placeholder(),
            selected: false,
        })
    }

    fn app_with_containers(items: Vec<ResourceItem>) -> App {
        let state = Arc::new(StateStore::default());
        state.replace_collection(ResourceKind::Containers, items);
        let provider = Arc::new(CachedProvider::new(Arc::new(Offline), Arc::new(TtlCache::new())));
        let mut app = App::new(state, provider, RefreshTrigger::default(), Config::default(), false);
        app.sync();
        app
    }

    #[test]
    fn test_start_rename_prefills_selected_container() {
        let mut app = app_with_containers(vec![container("c1", "web")]);
        app.start_rename();

        assert_eq!(app.mode, Mode::Rename);
        assert_eq!(app.rename_target.as_deref(), Some("c1"));
        assert_eq!(app.rename_text, "web");
    }

    #[test]
    fn test_start_rename_without_rows_stays_normal() {
        let mut app = app_with_containers(Vec::new());
        app.start_rename();

        assert_eq!(app.mode, Mode::Normal);
        assert!(app.rename_target.is_none());
    }

    #[tokio::test]
    async fn test_bulk_remove_confirm_lists_selected_rows() {
        let mut app =
            app_with_containers(vec![container("c1", "web"), container("c2", "db"), container("c3", "cache")]);
        app.state.select_all();
        app.state.move_selection(1, 10);
        app.state.toggle_item_selection();
        app.sync();
        let expected: Vec<String> = app
            .snapshot
            .active_items()
            .iter()
            .filter(|item| item.is_selected())
            .map(|item| item.display_name().to_string())
            .collect();
        assert_eq!(expected.len(), 2);

        app.request_action(Action::Remove).await;

        assert_eq!(app.mode, Mode::Confirm);
        let pending = app.pending_action.as_ref().map(|p| (p.target.clone(), p.targets.clone()));
        assert_eq!(pending, Some((ActionTarget::Selection, expected)));
    }

    #[test]
    fn test_confirm_messages() {
        let item = ActionTarget::Item {
            id: "c1".to_string(),
            label: "web".to_string(),
        };
        assert_eq!(
            confirm_message(&Action::Remove, ResourceKind::Containers, &item, 0),
            "Remove container 'web'?"
        );
        assert_eq!(
            confirm_message(&Action::Stop, ResourceKind::Containers, &ActionTarget::Selection, 3),
            "Stop 3 containers?"
        );
        assert!(
            confirm_message(&Action::Prune, ResourceKind::Images, &ActionTarget::Global, 0)
                .starts_with("Prune")
        );
    }
}
