//! Scripted in-memory provider for tests

use super::{Action, LogStream, ResourceProvider};
use crate::resource::{Metrics, ResourceItem, ResourceKind};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared, ordered record of provider and stream calls
pub(crate) type EventLog = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
pub(crate) struct MockProvider {
    lists: Mutex<HashMap<ResourceKind, Vec<ResourceItem>>>,
    metrics: Mutex<HashMap<String, Metrics>>,
    log_lines: Mutex<HashMap<String, Vec<String>>>,
    pub mutations: Mutex<Vec<(ResourceKind, String, Action)>>,
    pub events: EventLog,
    pub fail_reads: AtomicBool,
    pub fail_mutations: AtomicBool,
    /// Streams end after their scripted lines instead of idling
    pub streams_end: AtomicBool,
    pub update_available: AtomicBool,
    pub list_calls: AtomicUsize,
    pub metric_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_list(&self, kind: ResourceKind, items: Vec<ResourceItem>) {
        self.lists.lock().unwrap().insert(kind, items);
    }

    pub fn set_metrics(&self, id: &str, metrics: Metrics) {
        self.metrics.lock().unwrap().insert(id.to_string(), metrics);
    }

    pub fn set_log_lines(&self, id: &str, lines: &[&str]) {
        self.log_lines
            .lock()
            .unwrap()
            .insert(id.to_string(), lines.iter().map(|l| l.to_string()).collect());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn mutation_ids(&self) -> Vec<String> {
        self.mutations
            .lock()
            .unwrap()
            .iter()
            .map(|(_, id, _)| id.clone())
            .collect()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl ResourceProvider for MockProvider {
    async fn list_resources(&self, kind: ResourceKind) -> Result<Vec<ResourceItem>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("daemon unreachable"));
        }
        Ok(self
            .lists
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }

    async fn mutate(&self, kind: ResourceKind, id: &str, action: &Action) -> Result<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(anyhow!("{} refused for {}", action, id));
        }
        self.mutations
            .lock()
            .unwrap()
            .push((kind, id.to_string(), action.clone()));
        Ok(())
    }

    async fn get_metrics(&self, _kind: ResourceKind, id: &str) -> Result<Metrics> {
        self.metric_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("daemon unreachable"));
        }
        self.metrics
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .ok_or_else(|| anyhow!("no stats for {}", id))
    }

    async fn stream_logs(&self, id: &str, _tail: usize) -> Result<Box<dyn LogStream>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("daemon unreachable"));
        }
        self.record(format!("attach {}", id));
        let lines = self
            .log_lines
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(MockLogStream {
            id: id.to_string(),
            lines: lines.into(),
            ends: self.streams_end.load(Ordering::SeqCst),
            terminated: false,
            events: self.events.clone(),
        }))
    }

    async fn self_usage(&self) -> Result<String> {
        Ok("CPU: 1.0% MEM: 10.0MB".to_string())
    }

    async fn check_for_update(&self) -> bool {
        self.update_available.load(Ordering::SeqCst)
    }
}

/// Yields its scripted lines, then idles (or ends) until terminated
pub(crate) struct MockLogStream {
    id: String,
    lines: VecDeque<String>,
    ends: bool,
    terminated: bool,
    events: EventLog,
}

#[async_trait]
impl LogStream for MockLogStream {
    async fn next_line(&mut self) -> Result<Option<String>> {
        if self.terminated {
            return Ok(None);
        }
        if let Some(line) = self.lines.pop_front() {
            return Ok(Some(line));
        }
        if self.ends {
            return Ok(None);
        }
        std::future::pending().await
    }

    fn terminate(&mut self) {
        self.terminated = true;
        self.events
            .lock()
            .unwrap()
            .push(format!("terminate {}", self.id));
    }

    async fn wait(&mut self, _timeout: Duration) -> bool {
        self.terminated
    }

    fn kill(&mut self) {
        self.events.lock().unwrap().push(format!("kill {}", self.id));
    }
}
