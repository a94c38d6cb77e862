//! Action dispatch
//!
//! Runs mutating actions from the foreground: single item, bulk selection,
//! or the global prune. Each run reports to the status line and the
//! notification history, then asks the list poller for an immediate
//! refresh.

use crate::notification::NotificationManager;
use crate::poller::RefreshTrigger;
use crate::provider::{Action, CachedProvider, MutationOutcome};
use crate::resource::ResourceKind;
use crate::state::StateStore;
use std::sync::Arc;

pub const READONLY_WARNING: &str = "Read-only mode: actions are disabled";
pub const NOTHING_SELECTED: &str = "No items selected";

/// Target label used for the global prune
const PRUNE_TARGET: &str = "unused resources";

pub struct ActionDispatcher {
    provider: Arc<CachedProvider>,
    state: Arc<StateStore>,
    refresh: RefreshTrigger,
    readonly: bool,
}

impl ActionDispatcher {
    pub fn new(
        provider: Arc<CachedProvider>,
        state: Arc<StateStore>,
        refresh: RefreshTrigger,
        readonly: bool,
    ) -> Self {
        Self {
            provider,
            state,
            refresh,
            readonly,
        }
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Run `action` on one item. `label` is what the user sees (name rather
    /// than id).
    pub async fn run_single(
        &self,
        kind: ResourceKind,
        id: &str,
        label: &str,
        action: Action,
        notifications: &mut NotificationManager,
    ) -> MutationOutcome {
        if self.readonly {
            self.state.set_error(READONLY_WARNING);
            return MutationOutcome::failure(READONLY_WARNING);
        }
        if !action.applies_to(kind) {
            let reason = format!("{} is not available for {}", action, kind.noun(2));
            self.state.set_error(reason.as_str());
            return MutationOutcome::failure(reason);
        }

        let notification = notifications.create_notification(action.clone(), kind, label.to_string());
        let outcome = self.provider.mutate(kind, id, &action).await;

        match &outcome.reason {
            None => {
                self.state
                    .set_message(format!("{} {}", action.past_tense(), label));
                notifications.mark_success(notification);
            },
            Some(reason) => {
                self.state.set_error(format!(
                    "Failed to {} {}: {}",
                    action.display_name().to_lowercase(),
                    label,
                    reason
                ));
                notifications.mark_error(notification, reason.clone());
            },
        }

        self.refresh.request();
        outcome
    }

    /// Remove unused containers, images, volumes and networks
    pub async fn run_prune(&self, notifications: &mut NotificationManager) -> MutationOutcome {
        let kind = self.state.active_kind();
        self.run_single(kind, "", PRUNE_TARGET, Action::Prune, notifications)
            .await
    }

    /// Run `action` on every selected row of the active kind. Returns the
    /// number of items it succeeded on.
    pub async fn run_bulk(&self, action: Action, notifications: &mut NotificationManager) -> usize {
        if self.readonly {
            self.state.set_error(READONLY_WARNING);
            return 0;
        }

        let kind = self.state.active_kind();
        if !action.supports_bulk(kind) {
            self.state.set_error(format!(
                "{} is not available for selected {}",
                action,
                kind.noun(2)
            ));
            return 0;
        }

        let ids = self.state.selected_ids();
        if ids.is_empty() {
            self.state.set_message(NOTHING_SELECTED);
            return 0;
        }

        let total = ids.len();
        let target = format!("{} {}", total, kind.noun(total));
        let notification = notifications.create_notification(action.clone(), kind, target.clone());

        let mut succeeded = 0;
        let mut failures = Vec::new();
        for id in &ids {
            let outcome = self.provider.mutate(kind, id, &action).await;
            match outcome.reason {
                None => succeeded += 1,
                Some(reason) => failures.push(format!("{}: {}", id, reason)),
            }
        }

        if failures.is_empty() {
            self.state
                .set_message(format!("{} {}", action.past_tense(), target));
            notifications.mark_success(notification);
        } else {
            let summary = format!(
                "{} {} of {} {}; {}",
                action.past_tense(),
                succeeded,
                total,
                kind.noun(total),
                failures.join(", ")
            );
            tracing::warn!("bulk {} partly failed: {}", action, summary);
            self.state.set_error(summary.as_str());
            notifications.mark_error(notification, summary);
        }

        self.refresh.request();
        succeeded
    }
}
