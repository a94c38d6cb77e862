//! Resource model
//!
//! This module defines the five kinds of Docker resources tdock tracks and
//! the item types the pollers fetch for each of them.
//!
//! # Architecture
//!
//! - [`ResourceKind`] - closed set of kinds; every kind-specific decision
//!   (identity, cache key, filter fields, sort key) is an exhaustive match
//! - [`ResourceItem`] - one row of any kind, carrying its `selected` flag
//!   and, for containers, the metrics measured by the metrics poller
//! - [`projection`] - the pure filter + sort transform used by the state store
//!
//! Items are replaced wholesale on every poll. The state store merges the
//! fields a list refresh does not fetch (selection, metrics) by identity.

pub mod projection;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use projection::{project, project_indices, SortMode};

/// Placeholder shown for metrics that have not been measured yet
pub const METRIC_PLACEHOLDER: &str = "--";

/// The kinds of resources shown by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Containers,
    Images,
    Volumes,
    Networks,
    Compose,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Containers,
        ResourceKind::Images,
        ResourceKind::Volumes,
        ResourceKind::Networks,
        ResourceKind::Compose,
    ];

    /// Cache key prefix for the list of this kind
    pub fn cache_prefix(self) -> &'static str {
        match self {
            Self::Containers => "containers",
            Self::Images => "images",
            Self::Volumes => "volumes",
            Self::Networks => "networks",
            Self::Compose => "composes",
        }
    }

    /// Cache key prefix for per-item metrics, if this kind has any
    pub fn metrics_prefix(self) -> Option<&'static str> {
        match self {
            Self::Containers => Some("container_stats"),
            Self::Images | Self::Volumes | Self::Networks | Self::Compose => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Containers => "Containers",
            Self::Images => "Images",
            Self::Volumes => "Volumes",
            Self::Networks => "Networks",
            Self::Compose => "Compose",
        }
    }

    /// Noun used in messages ("Removed 3 images")
    pub fn noun(self, count: usize) -> &'static str {
        let singular = count == 1;
        match self {
            Self::Containers if singular => "container",
            Self::Containers => "containers",
            Self::Images if singular => "image",
            Self::Images => "images",
            Self::Volumes if singular => "volume",
            Self::Volumes => "volumes",
            Self::Networks if singular => "network",
            Self::Networks => "networks",
            Self::Compose if singular => "compose project",
            Self::Compose => "compose projects",
        }
    }

    /// Only containers have a log stream
    pub fn has_logs(self) -> bool {
        matches!(self, Self::Containers)
    }

    pub fn index(self) -> usize {
        match self {
            Self::Containers => 0,
            Self::Images => 1,
            Self::Volumes => 2,
            Self::Networks => 3,
            Self::Compose => 4,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "containers" | "container" => Some(Self::Containers),
            "images" | "image" => Some(Self::Images),
            "volumes" | "volume" => Some(Self::Volumes),
            "networks" | "network" => Some(Self::Networks),
            "compose" | "composes" => Some(Self::Compose),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Utilization measured for a running container
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    /// CPU utilization in percent
    pub cpu_percent: Option<f64>,
    /// Resident memory in MB
    pub memory_mb: Option<f64>,
}

impl Metrics {
    pub fn new(cpu_percent: f64, memory_mb: f64) -> Self {
        Self {
            cpu_percent: Some(cpu_percent),
            memory_mb: Some(memory_mb),
        }
    }

    /// Sentinel for "not measured"
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn cpu_display(&self) -> String {
        match self.cpu_percent {
            Some(cpu) => format!("{:.1}%", cpu),
            None => METRIC_PLACEHOLDER.to_string(),
        }
    }

    pub fn memory_display(&self) -> String {
        match self.memory_mb {
            Some(mem) => format!("{:.1}MB", mem),
            None => METRIC_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Container {
    pub id: String,
    pub short_id: String,
    pub name: String,
    pub status: String,
    pub image: String,
    pub project: String,
    pub metrics: Metrics,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Image {
    pub id: String,
    pub short_id: String,
    pub tags: Vec<String>,
    pub size_mb: f64,
    pub created: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Volume {
    pub name: String,
    pub driver: String,
    pub mountpoint: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub driver: String,
    pub subnet: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComposeProject {
    pub name: String,
    pub config_files: String,
    /// Shared status of all services, or "mixed"
    pub status: String,
    pub selected: bool,
}

/// One row of any resource kind
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceItem {
    Container(Container),
    Image(Image),
    Volume(Volume),
    Network(Network),
    Compose(ComposeProject),
}

impl ResourceItem {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Container(_) => ResourceKind::Containers,
            Self::Image(_) => ResourceKind::Images,
            Self::Volume(_) => ResourceKind::Volumes,
            Self::Network(_) => ResourceKind::Networks,
            Self::Compose(_) => ResourceKind::Compose,
        }
    }

    /// Stable key addressing this item across polls
    pub fn identity(&self) -> &str {
        match self {
            Self::Container(c) => &c.id,
            Self::Image(i) => &i.id,
            Self::Volume(v) => &v.name,
            Self::Network(n) => &n.id,
            Self::Compose(p) => &p.name,
        }
    }

    /// Human-readable label
    pub fn display_name(&self) -> &str {
        match self {
            Self::Container(c) => &c.name,
            Self::Image(i) => i.tags.first().map(String::as_str).unwrap_or(&i.short_id),
            Self::Volume(v) => &v.name,
            Self::Network(n) => &n.name,
            Self::Compose(p) => &p.name,
        }
    }

    pub fn status(&self) -> Option<&str> {
        match self {
            Self::Container(c) => Some(&c.status),
            Self::Compose(p) => Some(&p.status),
            Self::Image(_) | Self::Volume(_) | Self::Network(_) => None,
        }
    }

    /// Whether the metrics poller should measure this item
    pub fn is_active(&self) -> bool {
        match self {
            Self::Container(c) => c.status == "running",
            Self::Image(_) | Self::Volume(_) | Self::Network(_) | Self::Compose(_) => false,
        }
    }

    pub fn is_selected(&self) -> bool {
        match self {
            Self::Container(c) => c.selected,
            Self::Image(i) => i.selected,
            Self::Volume(v) => v.selected,
            Self::Network(n) => n.selected,
            Self::Compose(p) => p.selected,
        }
    }

    pub fn set_selected(&mut self, selected: bool) {
        match self {
            Self::Container(c) => c.selected = selected,
            Self::Image(i) => i.selected = selected,
            Self::Volume(v) => v.selected = selected,
            Self::Network(n) => n.selected = selected,
            Self::Compose(p) => p.selected = selected,
        }
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        match self {
            Self::Container(c) => Some(&c.metrics),
            Self::Image(_) | Self::Volume(_) | Self::Network(_) | Self::Compose(_) => None,
        }
    }

    /// Store new metrics. Returns true when the visible value changed.
    pub fn set_metrics(&mut self, metrics: Metrics) -> bool {
        match self {
            Self::Container(c) if c.metrics != metrics => {
                c.metrics = metrics;
                true
            }
            _ => false,
        }
    }

    /// Carry over the fields a list refresh does not fetch
    pub fn inherit_from(&mut self, prior: &ResourceItem) {
        self.set_selected(prior.is_selected());
        if let Some(metrics) = prior.metrics() {
            self.set_metrics(*metrics);
        }
    }
}

/// Format megabytes for display
pub fn format_size_mb(size_mb: f64) -> String {
    if size_mb >= 1024.0 {
        format!("{:.1} GB", size_mb / 1024.0)
    } else {
        format!("{:.1} MB", size_mb)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn container(id: &str, name: &str, status: &str) -> ResourceItem {
        ResourceItem::Container(Container {
            id: id.to_string(),
            short_id: id.chars().take(12).collect(),
            name: name.to_string(),
            status: status.to_string(),
            image: format!("{}:latest", name),
            project: "standalone".to_string(),
            ..Default::default()
        })
    }

    pub(crate) fn volume(name: &str) -> ResourceItem {
        ResourceItem::Volume(Volume {
            name: name.to_string(),
            driver: "local".to_string(),
            mountpoint: format!("/var/lib/docker/volumes/{}/_data", name),
            selected: false,
        })
    }

    pub(crate) fn image(id: &str, tags: &[&str]) -> ResourceItem {
        ResourceItem::Image(Image {
            id: id.to_string(),
            short_id: id.chars().take(12).collect(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            size_mb: 100.0,
            created: "2024-01-01".to_string(),
            selected: false,
        })
    }

    #[test]
    fn test_identity_per_kind() {
        assert_eq!(container("abc123", "web", "running").identity(), "abc123");
        assert_eq!(volume("data").identity(), "data");
        assert_eq!(image("sha256:1", &["nginx:latest"]).identity(), "sha256:1");
    }

    #[test]
    fn test_inherit_keeps_selection_and_metrics() {
        let mut prior = container("c1", "web", "running");
        prior.set_selected(true);
        prior.set_metrics(Metrics::new(12.5, 64.0));

        let mut fresh = container("c1", "web-renamed", "running");
        fresh.inherit_from(&prior);

        assert!(fresh.is_selected());
        assert_eq!(fresh.metrics(), Some(&Metrics::new(12.5, 64.0)));
        assert_eq!(fresh.display_name(), "web-renamed");
    }

    #[test]
    fn test_set_metrics_reports_change() {
        let mut item = container("c1", "web", "running");
        assert!(item.set_metrics(Metrics::new(1.0, 2.0)));
        assert!(!item.set_metrics(Metrics::new(1.0, 2.0)));
        assert!(!volume("v").set_metrics(Metrics::new(1.0, 2.0)));
    }

    #[test]
    fn test_kind_cycling_wraps() {
        assert_eq!(ResourceKind::Compose.next(), ResourceKind::Containers);
        assert_eq!(ResourceKind::Containers.previous(), ResourceKind::Compose);
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_str(kind.cache_prefix()), Some(kind));
        }
    }

    #[test]
    fn test_metrics_display() {
        assert_eq!(Metrics::placeholder().cpu_display(), METRIC_PLACEHOLDER);
        assert_eq!(Metrics::new(3.14159, 10.0).cpu_display(), "3.1%");
        assert_eq!(Metrics::new(0.0, 64.0).memory_display(), "64.0MB");
    }
}
