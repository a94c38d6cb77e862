//! Dashboard statistics
//!
//! Aggregates over the full (unfiltered) collections for the stats view.

use crate::cache::CacheStats;
use crate::resource::{ResourceItem, ResourceKind};
use crate::state::StateStore;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerStats {
    pub total: usize,
    pub running: usize,
    /// Exited or created
    pub stopped: usize,
    pub paused: usize,
    pub total_cpu: f64,
    pub total_memory_mb: f64,
    /// Averages over the containers that have a measurement
    pub avg_cpu: f64,
    pub avg_memory_mb: f64,
    /// Containers per compose project
    pub projects: BTreeMap<String, usize>,
}

impl ContainerStats {
    pub fn from_items(items: &[ResourceItem]) -> Self {
        let mut stats = Self::default();
        let (mut cpu_count, mut mem_count) = (0usize, 0usize);

        for item in items {
            let ResourceItem::Container(c) = item else {
                continue;
            };
            stats.total += 1;
            match c.status.as_str() {
                "running" => stats.running += 1,
                "exited" | "created" => stats.stopped += 1,
                "paused" => stats.paused += 1,
                _ => {},
            }
            *stats.projects.entry(c.project.clone()).or_default() += 1;

            if let Some(cpu) = c.metrics.cpu_percent {
                stats.total_cpu += cpu;
                cpu_count += 1;
            }
            if let Some(mem) = c.metrics.memory_mb {
                stats.total_memory_mb += mem;
                mem_count += 1;
            }
        }

        stats.avg_cpu = average(stats.total_cpu, cpu_count);
        stats.avg_memory_mb = average(stats.total_memory_mb, mem_count);
        stats
    }
}

/// Image size buckets: <10MB, 10-100MB, 100MB-1GB, >1GB
pub const SIZE_BUCKETS: [&str; 4] = ["<10MB", "10-100MB", "100MB-1GB", ">1GB"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageStats {
    pub total: usize,
    pub total_size_mb: f64,
    pub avg_size_mb: f64,
    pub tagged: usize,
    pub untagged: usize,
    /// Counts per [`SIZE_BUCKETS`] entry
    pub size_distribution: [usize; 4],
}

impl ImageStats {
    pub fn from_items(items: &[ResourceItem]) -> Self {
        let mut stats = Self::default();
        for item in items {
            let ResourceItem::Image(image) = item else {
                continue;
            };
            stats.total += 1;
            stats.total_size_mb += image.size_mb;

            let untagged = image.tags.is_empty() || image.tags.iter().all(|t| t == "<none>");
            if untagged {
                stats.untagged += 1;
            } else {
                stats.tagged += 1;
            }

            let bucket = match image.size_mb {
                s if s < 10.0 => 0,
                s if s < 100.0 => 1,
                s if s < 1000.0 => 2,
                _ => 3,
            };
            stats.size_distribution[bucket] += 1;
        }
        stats.avg_size_mb = average(stats.total_size_mb, stats.total);
        stats
    }
}

/// Count plus a per-driver breakdown, used for volumes and networks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverStats {
    pub total: usize,
    pub drivers: BTreeMap<String, usize>,
}

impl DriverStats {
    pub fn from_items(items: &[ResourceItem]) -> Self {
        let mut stats = Self::default();
        for item in items {
            let driver = match item {
                ResourceItem::Volume(v) => &v.driver,
                ResourceItem::Network(n) => &n.driver,
                _ => continue,
            };
            stats.total += 1;
            *stats.drivers.entry(driver.clone()).or_default() += 1;
        }
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposeStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
}

impl ComposeStats {
    pub fn from_items(items: &[ResourceItem]) -> Self {
        let mut stats = Self::default();
        for item in items {
            if let ResourceItem::Compose(p) = item {
                stats.total += 1;
                *stats.by_status.entry(p.status.clone()).or_default() += 1;
            }
        }
        stats
    }
}

/// Usage of this process, parsed back from "CPU: x% MEM: yMB"
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SelfUsage {
    pub cpu_percent: f64,
    pub memory_mb: f64,
}

impl SelfUsage {
    pub fn parse(usage: &str) -> Self {
        let mut parsed = Self::default();
        let parts: Vec<&str> = usage.split_whitespace().collect();
        for pair in parts.windows(2) {
            match pair[0] {
                "CPU:" => {
                    parsed.cpu_percent = pair[1].trim_end_matches('%').parse().unwrap_or(0.0);
                },
                "MEM:" => {
                    parsed.memory_mb = pair[1].trim_end_matches("MB").parse().unwrap_or(0.0);
                },
                _ => {},
            }
        }
        parsed
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub containers: ContainerStats,
    pub images: ImageStats,
    pub volumes: DriverStats,
    pub networks: DriverStats,
    pub compose: ComposeStats,
    pub system: SelfUsage,
    pub cache: Option<CacheStats>,
}

impl DashboardStats {
    pub fn collect(state: &StateStore, cache: Option<CacheStats>) -> Self {
        let usage = state.snapshot().self_usage;
        Self {
            containers: ContainerStats::from_items(&state.collection(ResourceKind::Containers)),
            images: ImageStats::from_items(&state.collection(ResourceKind::Images)),
            volumes: DriverStats::from_items(&state.collection(ResourceKind::Volumes)),
            networks: DriverStats::from_items(&state.collection(ResourceKind::Networks)),
            compose: ComposeStats::from_items(&state.collection(ResourceKind::Compose)),
            system: SelfUsage::parse(&usage),
            cache,
        }
    }
}

fn average(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
