//! Projection
//!
//! Pure filter + sort over a raw collection. The result must only depend on
//! the input set, not on the order the provider returned it in, otherwise
//! rows jump around while pollers replace collections.

use super::{ResourceItem, ResourceKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort order of the container list. Other kinds always sort by name (or id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Name,
    Status,
    Cpu,
}

impl SortMode {
    pub fn next(self) -> Self {
        match self {
            Self::Name => Self::Status,
            Self::Status => Self::Cpu,
            Self::Cpu => Self::Name,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Status => "status",
            Self::Cpu => "cpu",
        }
    }
}

/// Indices into `items` of the visible rows, in display order
pub fn project_indices(
    items: &[ResourceItem],
    kind: ResourceKind,
    sort: SortMode,
    filter: &str,
) -> Vec<usize> {
    let needle = filter.to_lowercase();
    let mut indices: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.kind() == kind)
        .filter(|(_, item)| needle.is_empty() || matches_filter(item, &needle))
        .map(|(idx, _)| idx)
        .collect();

    indices.sort_by(|&a, &b| compare(&items[a], &items[b], sort));
    indices
}

/// Visible rows, cloned in display order
pub fn project(
    items: &[ResourceItem],
    kind: ResourceKind,
    sort: SortMode,
    filter: &str,
) -> Vec<ResourceItem> {
    project_indices(items, kind, sort, filter)
        .into_iter()
        .map(|idx| items[idx].clone())
        .collect()
}

/// `needle` must already be lowercase
fn matches_filter(item: &ResourceItem, needle: &str) -> bool {
    let contains = |s: &str| s.to_lowercase().contains(needle);
    match item {
        ResourceItem::Container(c) => contains(&c.name) || contains(&c.image),
        ResourceItem::Image(i) => contains(&i.id) || i.tags.iter().any(|t| contains(t)),
        ResourceItem::Volume(v) => contains(&v.name),
        ResourceItem::Network(n) => contains(&n.name),
        ResourceItem::Compose(p) => contains(&p.name),
    }
}

fn compare(a: &ResourceItem, b: &ResourceItem, sort: SortMode) -> Ordering {
    let primary = match (a, b) {
        (ResourceItem::Container(x), ResourceItem::Container(y)) => match sort {
            SortMode::Name => x.name.cmp(&y.name),
            SortMode::Status => x.status.cmp(&y.status).then_with(|| x.name.cmp(&y.name)),
            // Descending, unmeasured containers last
            SortMode::Cpu => cpu_key(y)
                .total_cmp(&cpu_key(x))
                .then_with(|| x.name.cmp(&y.name)),
        },
        // Images have no name of their own
        (ResourceItem::Image(x), ResourceItem::Image(y)) => x.id.cmp(&y.id),
        (ResourceItem::Volume(x), ResourceItem::Volume(y)) => x.name.cmp(&y.name),
        (ResourceItem::Network(x), ResourceItem::Network(y)) => x.name.cmp(&y.name),
        (ResourceItem::Compose(x), ResourceItem::Compose(y)) => x.name.cmp(&y.name),
        _ => a.kind().cmp(&b.kind()),
    };
    primary.then_with(|| a.identity().cmp(b.identity()))
}

fn cpu_key(c: &super::Container) -> f64 {
    c.metrics.cpu_percent.unwrap_or(-1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::tests::{container, image, volume};
    use crate::resource::Metrics;

    fn names(items: &[ResourceItem]) -> Vec<&str> {
        items.iter().map(|i| i.display_name()).collect()
    }

    #[test]
    fn test_filter_matches_name_substring() {
        let items = vec![
            container("1", "web-app", "running"),
            container("2", "db-mongo", "running"),
            container("3", "cache-redis", "exited"),
        ];

        let visible = project(&items, ResourceKind::Containers, SortMode::Name, "web");
        assert_eq!(names(&visible), vec!["web-app"]);
    }

    #[test]
    fn test_filter_is_case_insensitive_and_checks_image() {
        let items = vec![
            container("1", "api", "running"),
            container("2", "worker", "running"),
        ];

        // container("2", "worker") runs image "worker:latest"
        let visible = project(&items, ResourceKind::Containers, SortMode::Name, "WORKER:LAT");
        assert_eq!(names(&visible), vec!["worker"]);
    }

    #[test]
    fn test_image_filter_uses_tags() {
        let items = vec![
            image("sha256:aaa", &["nginx:latest"]),
            image("sha256:bbb", &["postgres:16", "postgres:latest"]),
        ];

        let visible = project(&items, ResourceKind::Images, SortMode::Name, "postgres:16");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].identity(), "sha256:bbb");
    }

    #[test]
    fn test_empty_filter_returns_sorted_full_list() {
        let items = vec![volume("zeta"), volume("alpha"), volume("mid")];
        let visible = project(&items, ResourceKind::Volumes, SortMode::Name, "");
        assert_eq!(names(&visible), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_cpu_sort_descending_unmeasured_last() {
        let mut busy = container("1", "busy", "running");
        busy.set_metrics(Metrics::new(80.0, 10.0));
        let mut idle = container("2", "idle", "running");
        idle.set_metrics(Metrics::new(0.5, 10.0));
        let unknown = container("3", "aaa-unknown", "running");

        let items = vec![idle, unknown, busy];
        let visible = project(&items, ResourceKind::Containers, SortMode::Cpu, "");
        assert_eq!(names(&visible), vec!["busy", "idle", "aaa-unknown"]);
    }

    #[test]
    fn test_status_sort_groups_by_status() {
        let items = vec![
            container("1", "b", "running"),
            container("2", "a", "running"),
            container("3", "c", "exited"),
        ];
        let visible = project(&items, ResourceKind::Containers, SortMode::Status, "");
        assert_eq!(names(&visible), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_order_independent_of_input_order() {
        let forward = vec![
            container("b", "same", "running"),
            container("a", "same", "running"),
            container("c", "other", "running"),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let first = project(&forward, ResourceKind::Containers, SortMode::Name, "");
        let second = project(&reversed, ResourceKind::Containers, SortMode::Name, "");
        assert_eq!(first, second);
        assert_eq!(first[1].identity(), "a");
    }

    #[test]
    fn test_foreign_kinds_are_ignored() {
        let items = vec![container("1", "web", "running"), volume("web")];
        let visible = project(&items, ResourceKind::Volumes, SortMode::Name, "web");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].kind(), ResourceKind::Volumes);
    }
}
