//! Configuration Management
//!
//! Persistent configuration stored as JSON at
//! `<config_dir>/tdock/config.json`. Every field has a default, so a
//! missing, partial or corrupt file still yields a usable configuration.

use crate::resource::ResourceKind;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub refresh: RefreshConfig,
    pub cache: CacheConfig,
    pub logs: LogsConfig,
    pub ui: UiConfig,
    pub docker: DockerConfig,
}

/// Poller cadences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefreshConfig {
    /// List poller tick
    pub tick_ms: u64,
    /// Containers refresh every N ticks
    pub fast_every: u64,
    /// Images, volumes, networks and compose projects refresh every N ticks
    pub slow_every: u64,
    /// Cache sweep every N ticks
    pub cleanup_every: u64,
    pub metrics_interval_ms: u64,
    pub metrics_yield_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            tick_ms: 500,
            fast_every: 2,
            slow_every: 10,
            cleanup_every: 60,
            metrics_interval_ms: 2000,
            metrics_yield_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub default_ttl_ms: u64,
    /// Per key prefix, merged over the built-in TTL table
    pub ttl_overrides_ms: BTreeMap<String, u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 2000,
            ttl_overrides_ms: BTreeMap::new(),
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn ttl_overrides(&self) -> BTreeMap<String, Duration> {
        self.ttl_overrides_ms
            .iter()
            .map(|(prefix, ms)| (prefix.clone(), Duration::from_millis(*ms)))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogsConfig {
    /// Lines kept in the log pane
    pub max_lines: usize,
    /// Lines requested when attaching to a stream
    pub tail: usize,
    pub read_timeout_ms: u64,
    pub terminate_wait_ms: u64,
    pub retry_backoff_ms: u64,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            max_lines: 1000,
            tail: 50,
            read_timeout_ms: 100,
            terminate_wait_ms: 200,
            retry_backoff_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// How long an error stays on the status line
    pub error_display_secs: u64,
    /// Last viewed tab
    pub last_kind: Option<ResourceKind>,
    /// Notification detail: minimal, detailed or verbose
    pub notification_detail: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            error_display_secs: 3,
            last_kind: None,
            notification_detail: "detailed".to_string(),
        }
    }
}

impl UiConfig {
    pub fn error_display(&self) -> Duration {
        Duration::from_secs(self.error_display_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DockerConfig {
    /// Docker client binary
    pub binary: String,
    /// Git checkout of tdock used to look for updates
    pub source_dir: Option<PathBuf>,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            source_dir: None,
        }
    }
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tdock").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_json(&content),
            Err(_) => Self::default(),
        }
    }

    /// Parse configuration, falling back to defaults on error
    pub fn from_json(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid config: {}", e);
            Self::default()
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Remember the tab to reopen next time and save
    pub fn set_last_kind(&mut self, kind: ResourceKind) -> Result<()> {
        self.ui.last_kind = Some(kind);
        self.save()
    }
}
