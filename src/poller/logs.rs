//! Log stream poller
//!
//! Follows the log stream of the container under the cursor. When the
//! selection moves, the old stream is asked to terminate, given a short
//! grace period, and killed if still alive, before the new one is attached.

use super::{PollerSettings, Shutdown};
use crate::provider::{CachedProvider, LogStream};
use crate::state::{StateStore, LOADING_PLACEHOLDER};
use futures::FutureExt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Upper bound on lines taken from a stream in one iteration
const MAX_LINES_PER_READ: usize = 1000;

pub struct LogPoller {
    state: Arc<StateStore>,
    provider: Arc<CachedProvider>,
    tail: usize,
    read_timeout: Duration,
    terminate_wait: Duration,
    retry_backoff: Duration,
    /// Container currently followed
    current: Option<String>,
    stream: Option<Box<dyn LogStream>>,
    /// Earliest time to re-attach after the stream died
    retry_at: Option<Instant>,
    /// A re-attached stream replays its tail; its first batch replaces the buffer
    replace_pending: bool,
}

impl LogPoller {
    pub fn new(
        state: Arc<StateStore>,
        provider: Arc<CachedProvider>,
        settings: &PollerSettings,
    ) -> Self {
        Self {
            state,
            provider,
            tail: settings.log_tail,
            read_timeout: settings.log_read_timeout,
            terminate_wait: settings.log_terminate_wait,
            retry_backoff: settings.log_retry_backoff,
            current: None,
            stream: None,
            retry_at: None,
            replace_pending: false,
        }
    }

    pub async fn run(mut self, mut shutdown: Shutdown) {
        while !shutdown.is_triggered() {
            self.step().await;
            if shutdown.sleep(self.read_timeout).await {
                break;
            }
        }
        self.detach().await;
        tracing::debug!("log poller stopped");
    }

    pub async fn step(&mut self) {
        let target = self.state.log_target();
        if target != self.current {
            self.switch_to(target).await;
            return;
        }

        let Some(id) = self.current.clone() else {
            return;
        };

        if self.stream.is_none() {
            let due = self.retry_at.map_or(true, |at| Instant::now() >= at);
            if due {
                self.replace_pending = true;
                self.attach(&id).await;
            }
            return;
        }

        self.read().await;
    }

    async fn switch_to(&mut self, target: Option<String>) {
        self.detach().await;
        self.retry_at = None;
        self.replace_pending = false;
        self.current = target;

        if let Some(id) = self.current.clone() {
            tracing::debug!("following logs of {}", id);
            self.state.reset_logs(LOADING_PLACEHOLDER);
            self.attach(&id).await;
        }
    }

    async fn attach(&mut self, id: &str) {
        self.stream = self.provider.stream_logs(id, self.tail).await;
        if self.stream.is_none() {
            self.retry_at = Some(Instant::now() + self.retry_backoff);
        }
    }

    /// Terminate the current stream, escalating to kill after the grace period
    async fn detach(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };
        stream.terminate();
        if !stream.wait(self.terminate_wait).await {
            tracing::debug!("log stream did not exit in {:?}, killing", self.terminate_wait);
            stream.kill();
        }
    }

    /// Wait briefly for a line, then take whatever else is already buffered
    async fn read(&mut self) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };

        let mut lines = Vec::new();
        let mut ended = false;

        match tokio::time::timeout(self.read_timeout, stream.next_line()).await {
            Err(_) => {}
            Ok(Ok(Some(line))) => {
                lines.push(line);
                while lines.len() < MAX_LINES_PER_READ {
                    match stream.next_line().now_or_never() {
                        Some(Ok(Some(line))) => lines.push(line),
                        Some(Ok(None)) | Some(Err(_)) => {
                            ended = true;
                            break;
                        }
                        None => break,
                    }
                }
            }
            Ok(Ok(None)) => ended = true,
            Ok(Err(e)) => {
                tracing::debug!("log stream error: {:#}", e);
                ended = true;
            }
        }

        if self.replace_pending && (ended || !lines.is_empty()) {
            self.replace_pending = false;
            self.state.replace_logs(lines);
        } else {
            self.state.append_logs(lines);
        }

        if ended {
            tracing::debug!("log stream ended, retrying in {:?}", self.retry_backoff);
            self.detach().await;
            self.retry_at = Some(Instant::now() + self.retry_backoff);
        }
    }
}
