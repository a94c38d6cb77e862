//! Notification System
//!
//! Records the actions run from the dashboard with their outcome, shows the
//! latest one as a toast and keeps a bounded history.

use crate::provider::Action;
use crate::resource::ResourceKind;
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Level of detail for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailLevel {
    /// Minimal: action + resource + status icon
    Minimal,
    /// Detailed: action + resource + duration
    #[default]
    Detailed,
    /// Verbose: all info including error details
    Verbose,
}

impl DetailLevel {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "minimal" => Self::Minimal,
            "verbose" => Self::Verbose,
            _ => Self::Detailed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Detailed => "detailed",
            Self::Verbose => "verbose",
        }
    }
}

/// Status of a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationStatus {
    /// Action sent to the daemon
    Pending,
    Success,
    /// Action failed with error message
    Error(String),
}

impl NotificationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error(_))
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Pending => "↻",
            Self::Success => "✓",
            Self::Error(_) => "✗",
        }
    }
}

/// A single notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub action: Action,
    pub kind: ResourceKind,
    /// Item name, or a count for bulk actions ("3 containers")
    pub target: String,
    pub status: NotificationStatus,
    pub created_at: Instant,
    pub created_wall: DateTime<Local>,
    pub completed_at: Option<Instant>,
}

impl Notification {
    pub fn new(action: Action, kind: ResourceKind, target: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            kind,
            target,
            status: NotificationStatus::Pending,
            created_at: Instant::now(),
            created_wall: Local::now(),
            completed_at: None,
        }
    }

    pub fn set_success(&mut self) {
        self.status = NotificationStatus::Success;
        self.completed_at = Some(Instant::now());
    }

    pub fn set_error(&mut self, error: String) {
        self.status = NotificationStatus::Error(error);
        self.completed_at = Some(Instant::now());
    }

    /// Duration of the action (or elapsed time if still running)
    pub fn duration(&self) -> Duration {
        self.completed_at
            .unwrap_or_else(Instant::now)
            .duration_since(self.created_at)
    }

    pub fn duration_display(&self) -> String {
        let d = self.duration();
        if d.as_secs() < 1 {
            format!("{}ms", d.as_millis())
        } else if d.as_secs() < 60 {
            format!("{}s", d.as_secs())
        } else {
            format!("{}m{}s", d.as_secs() / 60, d.as_secs() % 60)
        }
    }

    /// Wall clock time for the history view
    pub fn time_display(&self) -> String {
        self.created_wall.format("%H:%M:%S").to_string()
    }

    /// Format notification for toast display (short form)
    pub fn toast_message(&self, detail_level: DetailLevel) -> String {
        let icon = self.status.icon();
        let verb = match &self.status {
            NotificationStatus::Pending => self.action.present_participle(),
            NotificationStatus::Success => self.action.past_tense(),
            NotificationStatus::Error(_) => "Failed",
        };

        match detail_level {
            DetailLevel::Minimal => format!("{} {} {}", icon, verb, self.target),
            DetailLevel::Detailed => {
                if self.status.is_terminal() {
                    format!(
                        "{} {} {} ({})",
                        icon,
                        verb,
                        self.target,
                        self.duration_display()
                    )
                } else {
                    format!("{} {} {}...", icon, verb, self.target)
                }
            }
            DetailLevel::Verbose => {
                let base = format!("{} {} {} [{}]", icon, verb, self.target, self.kind);
                if let NotificationStatus::Error(ref err) = self.status {
                    format!("{} - {}", base, err)
                } else if self.status.is_terminal() {
                    format!("{} ({})", base, self.duration_display())
                } else {
                    format!("{}...", base)
                }
            }
        }
    }
}

/// Notification manager
pub struct NotificationManager {
    /// All notifications (recent first)
    pub notifications: VecDeque<Notification>,
    /// Maximum notifications to keep in history
    pub max_history: usize,
    /// Toast display duration
    pub toast_duration: Duration,
    /// Detail level for display
    pub detail_level: DetailLevel,
    last_toast_time: Option<Instant>,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationManager {
    pub fn new() -> Self {
        Self {
            notifications: VecDeque::new(),
            max_history: 50,
            toast_duration: Duration::from_secs(5),
            detail_level: DetailLevel::Detailed,
            last_toast_time: None,
        }
    }

    pub fn with_detail_level(mut self, detail_level: DetailLevel) -> Self {
        self.detail_level = detail_level;
        self
    }

    /// Record a new pending action
    pub fn create_notification(&mut self, action: Action, kind: ResourceKind, target: String) -> Uuid {
        let notification = Notification::new(action, kind, target);
        let id = notification.id;
        self.notifications.push_front(notification);
        self.last_toast_time = Some(Instant::now());
        self.trim_history();
        id
    }

    pub fn mark_success(&mut self, id: Uuid) {
        if let Some(notif) = self.notifications.iter_mut().find(|n| n.id == id) {
            notif.set_success();
            self.last_toast_time = Some(Instant::now());
        }
    }

    pub fn mark_error(&mut self, id: Uuid, error: String) {
        if let Some(notif) = self.notifications.iter_mut().find(|n| n.id == id) {
            notif.set_error(error);
            self.last_toast_time = Some(Instant::now());
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    /// Most recent notification while its toast is still visible
    pub fn current_toast(&self) -> Option<&Notification> {
        let last_time = self.last_toast_time?;
        if last_time.elapsed() > self.toast_duration {
            return None;
        }
        self.notifications.front()
    }

    pub fn in_progress_count(&self) -> usize {
        self.notifications
            .iter()
            .filter(|n| n.status == NotificationStatus::Pending)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.notifications
            .iter()
            .filter(|n| matches!(n.status, NotificationStatus::Error(_)))
            .count()
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
        self.last_toast_time = None;
    }

    fn trim_history(&mut self) {
        while self.notifications.len() > self.max_history {
            // Oldest finished one goes first
            if let Some(pos) = self.notifications.iter().rposition(|n| n.status.is_terminal()) {
                self.notifications.remove(pos);
            } else {
                self.notifications.pop_back();
            }
        }
    }

    pub fn has_notifications(&self) -> bool {
        !self.notifications.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_lifecycle() {
        let mut manager = NotificationManager::new();
        let id = manager.create_notification(
            Action::Start,
            ResourceKind::Containers,
            "web".to_string(),
        );
        assert_eq!(manager.in_progress_count(), 1);

        manager.mark_success(id);
        assert_eq!(manager.get(id).unwrap().status, NotificationStatus::Success);
        assert_eq!(manager.in_progress_count(), 0);
    }

    #[test]
    fn test_toast_message_formats() {
        let mut notif = Notification::new(
            Action::Remove,
            ResourceKind::Volumes,
            "data".to_string(),
        );
        let msg = notif.toast_message(DetailLevel::Minimal);
        assert_eq!(msg, "↻ Removing data");

        notif.set_error("volume is in use".to_string());
        let msg = notif.toast_message(DetailLevel::Verbose);
        assert!(msg.starts_with("✗ Failed data [Volumes]"));
        assert!(msg.ends_with("volume is in use"));
    }

    #[test]
    fn test_history_is_capped_dropping_finished_first() {
        let mut manager = NotificationManager::new();
        manager.max_history = 2;

        let oldest = manager.create_notification(Action::Stop, ResourceKind::Containers, "a".into());
        manager.mark_success(oldest);
        let pending = manager.create_notification(Action::Stop, ResourceKind::Containers, "b".into());
        manager.create_notification(Action::Stop, ResourceKind::Containers, "c".into());

        assert_eq!(manager.notifications.len(), 2);
        assert!(manager.get(oldest).is_none());
        assert!(manager.get(pending).is_some());
    }

    #[test]
    fn test_toast_expires() {
        let mut manager = NotificationManager::new();
        manager.toast_duration = Duration::ZERO;
        manager.create_notification(Action::Prune, ResourceKind::Images, "unused".into());
        std::thread::sleep(Duration::from_millis(5));
        assert!(manager.current_toast().is_none());
        assert!(manager.has_notifications());
    }

    #[test]
    fn test_detail_level_parsing() {
        assert_eq!(DetailLevel::from_str("VERBOSE"), DetailLevel::Verbose);
        assert_eq!(DetailLevel::from_str("unknown"), DetailLevel::Detailed);
        assert_eq!(DetailLevel::Minimal.as_str(), "minimal");
    }
}
