//! Resource provider interface
//!
//! The provider is the only component that talks to Docker. The rest of the
//! crate reaches it through [`CachedProvider`], which fronts reads with the
//! TTL cache and invalidates after successful mutations.
//!
//! - [`cached`] - cache-through wrapper used by pollers and actions
//! - [`docker`] - implementation shelling out to the `docker` CLI

pub mod cached;
pub mod docker;
#[cfg(test)]
pub(crate) mod mock;

use crate::resource::{Metrics, ResourceItem, ResourceKind};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

pub use cached::{CacheValue, CachedProvider, MutationOutcome};

/// Mutating operation on a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    Restart,
    Pause,
    Unpause,
    Remove,
    Rename(String),
    /// Compose: start all services
    Up,
    /// Compose: stop and remove services
    Down,
    /// Remove unused containers, images, volumes and networks
    Prune,
}

impl Action {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Stop => "Stop",
            Self::Restart => "Restart",
            Self::Pause => "Pause",
            Self::Unpause => "Unpause",
            Self::Remove => "Remove",
            Self::Rename(_) => "Rename",
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Prune => "Prune",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Start | Self::Up => "Started",
            Self::Stop | Self::Down => "Stopped",
            Self::Restart => "Restarted",
            Self::Pause => "Paused",
            Self::Unpause => "Unpaused",
            Self::Remove => "Removed",
            Self::Rename(_) => "Renamed",
            Self::Prune => "Pruned",
        }
    }

    pub fn present_participle(&self) -> &'static str {
        match self {
            Self::Start | Self::Up => "Starting",
            Self::Stop | Self::Down => "Stopping",
            Self::Restart => "Restarting",
            Self::Pause => "Pausing",
            Self::Unpause => "Unpausing",
            Self::Remove => "Removing",
            Self::Rename(_) => "Renaming",
            Self::Prune => "Pruning",
        }
    }

    /// Actions that need a confirmation dialog
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::Stop | Self::Remove | Self::Down | Self::Prune)
    }

    /// Whether this action can run over the bulk selection of `kind`
    pub fn supports_bulk(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Containers => {
                matches!(self, Self::Start | Self::Stop | Self::Restart | Self::Remove)
            }
            ResourceKind::Images | ResourceKind::Volumes | ResourceKind::Networks => {
                *self == Self::Remove
            }
            ResourceKind::Compose => matches!(self, Self::Up | Self::Down | Self::Remove),
        }
    }

    /// Whether `kind` supports this action
    pub fn applies_to(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Containers => matches!(
                self,
                Self::Start
                    | Self::Stop
                    | Self::Restart
                    | Self::Pause
                    | Self::Unpause
                    | Self::Remove
                    | Self::Rename(_)
                    | Self::Prune
            ),
            ResourceKind::Images | ResourceKind::Volumes | ResourceKind::Networks => {
                matches!(self, Self::Remove | Self::Prune)
            }
            ResourceKind::Compose => {
                matches!(self, Self::Up | Self::Down | Self::Pause | Self::Remove | Self::Prune)
            }
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A running log follower for one container
#[async_trait]
pub trait LogStream: Send {
    /// Next complete line. `Ok(None)` once the stream has ended.
    ///
    /// Must be cancel safe: the log poller wraps it in a timeout.
    async fn next_line(&mut self) -> Result<Option<String>>;

    /// Ask the stream to stop
    fn terminate(&mut self);

    /// Wait up to `timeout` for the stream to exit. Returns true if it did.
    async fn wait(&mut self, timeout: Duration) -> bool;

    /// Stop the stream without waiting
    fn kill(&mut self);
}

/// Access to the managed resources
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    async fn list_resources(&self, kind: ResourceKind) -> Result<Vec<ResourceItem>>;

    /// `id` is ignored for [`Action::Prune`]
    async fn mutate(&self, kind: ResourceKind, id: &str, action: &Action) -> Result<()>;

    async fn get_metrics(&self, kind: ResourceKind, id: &str) -> Result<Metrics>;

    async fn stream_logs(&self, id: &str, tail: usize) -> Result<Box<dyn LogStream>>;

    /// CPU/memory of this process, preformatted
    async fn self_usage(&self) -> Result<String>;

    async fn check_for_update(&self) -> bool {
        false
    }
}
