//! Docker CLI provider
//!
//! Talks to the daemon through the `docker` binary, asking for one JSON
//! document per line (`--format '{{json .}}'`). Parsing is kept in free
//! functions so it can be tested without a daemon.

use super::{Action, LogStream, ResourceProvider};
use crate::resource::{
    ComposeProject, Container, Image, Metrics, Network, ResourceItem, ResourceKind, Volume,
};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;
use sysinfo::{ProcessesToUpdate, System};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const JSON_FORMAT: &str = "{{json .}}";
const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";
const COMPOSE_FILES_LABEL: &str = "com.docker.compose.project.config_files";
const STANDALONE_PROJECT: &str = "standalone";
const UNTAGGED: &str = "<none>";

/// Lines buffered between the log reader tasks and the poller
const LOG_CHANNEL_SIZE: usize = 256;

/// Provider backed by the `docker` command line client
pub struct DockerProvider {
    binary: String,
    /// Checkout used to look for newer upstream commits
    source_dir: Option<PathBuf>,
    system: Mutex<System>,
}

impl DockerProvider {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            source_dir: None,
            system: Mutex::new(System::new()),
        }
    }

    pub fn with_source_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.source_dir = dir;
        self
    }

    /// Run `docker <args>` and return its stdout
    async fn run(&self, args: &[&str]) -> Result<String> {
        tracing::debug!("Executing: {} {}", self.binary, args.join(" "));

        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.binary))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} {} failed: {}", self.binary, args.join(" "), stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Version of the daemon, used as a reachability check at startup
    pub async fn server_version(&self) -> Result<String> {
        let out = self
            .run(&["version", "--format", "{{.Server.Version}}"])
            .await?;
        Ok(out.trim().to_string())
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    async fn containers(&self) -> Result<Vec<ParsedContainer>> {
        let out = self
            .run(&["ps", "-a", "--no-trunc", "--format", JSON_FORMAT])
            .await?;
        parse_containers(&out)
    }

    async fn networks(&self) -> Result<Vec<ResourceItem>> {
        let out = self
            .run(&["network", "ls", "--no-trunc", "--format", JSON_FORMAT])
            .await?;
        let records: Vec<NetworkRecord> = json_lines(&out)?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut args = vec!["network", "inspect", "--format", SUBNET_FORMAT];
        args.extend(records.iter().map(|r| r.id.as_str()));
        let subnets = match self.run(&args).await {
            Ok(out) => out.lines().map(|l| l.trim().to_string()).collect(),
            Err(e) => {
                tracing::debug!("network inspect failed: {:#}", e);
                Vec::new()
            }
        };

        Ok(build_networks(records, &subnets))
    }

    fn measure_self(&self) -> Result<String> {
        let pid = sysinfo::get_current_pid().map_err(|e| anyhow::anyhow!(e))?;
        let mut system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        let process = system
            .process(pid)
            .context("Current process not found")?;
        let mem_mb = process.memory() as f64 / 1024.0 / 1024.0;
        Ok(format!("CPU: {:.1}% MEM: {:.1}MB", process.cpu_usage(), mem_mb))
    }

    async fn git(&self, dir: &Path, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .await
            .context("Failed to execute git")?;
        if !output.status.success() {
            bail!("git {} failed", args.join(" "));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ResourceProvider for DockerProvider {
    async fn list_resources(&self, kind: ResourceKind) -> Result<Vec<ResourceItem>> {
        match kind {
            ResourceKind::Containers => Ok(self
                .containers()
                .await?
                .into_iter()
                .map(|parsed| ResourceItem::Container(parsed.container))
                .collect()),
            ResourceKind::Compose => Ok(group_compose(&self.containers().await?)),
            ResourceKind::Images => {
                let out = self
                    .run(&["images", "--no-trunc", "--format", JSON_FORMAT])
                    .await?;
                parse_images(&out)
            }
            ResourceKind::Volumes => {
                let out = self.run(&["volume", "ls", "--format", JSON_FORMAT]).await?;
                parse_volumes(&out)
            }
            ResourceKind::Networks => self.networks().await,
        }
    }

    async fn mutate(&self, kind: ResourceKind, id: &str, action: &Action) -> Result<()> {
        if *action == Action::Prune {
            for args in PRUNE_COMMANDS {
                self.run(args).await?;
            }
            return Ok(());
        }

        let args = mutation_args(kind, id, action)?;
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&args).await?;
        Ok(())
    }

    async fn get_metrics(&self, kind: ResourceKind, id: &str) -> Result<Metrics> {
        if kind != ResourceKind::Containers {
            bail!("{} have no metrics", kind);
        }
        let out = self
            .run(&["stats", "--no-stream", "--format", JSON_FORMAT, id])
            .await?;
        parse_stats(&out)
    }

    async fn stream_logs(&self, id: &str, tail: usize) -> Result<Box<dyn LogStream>> {
        let stream = DockerLogStream::spawn(&self.binary, id, tail)?;
        Ok(Box::new(stream))
    }

    async fn self_usage(&self) -> Result<String> {
        self.measure_self()
    }

    async fn check_for_update(&self) -> bool {
        let Some(dir) = self.source_dir.as_ref() else {
            return false;
        };

        if let Err(e) = self.git(dir, &["fetch", "--quiet"]).await {
            tracing::debug!("update check skipped: {:#}", e);
            return false;
        }
        match self.git(dir, &["rev-list", "HEAD..origin/main", "--count"]).await {
            Ok(out) => out.trim().parse::<u64>().map(|n| n > 0).unwrap_or(false),
            Err(e) => {
                tracing::debug!("update check failed: {:#}", e);
                false
            }
        }
    }
}

const PRUNE_COMMANDS: &[&[&str]] = &[
    &["container", "prune", "-f"],
    &["image", "prune", "-f"],
    &["volume", "prune", "-f"],
    &["network", "prune", "-f"],
];

const SUBNET_FORMAT: &str = "{{range .IPAM.Config}}{{.Subnet}} {{end}}";

/// CLI arguments for a single-item action
fn mutation_args(kind: ResourceKind, id: &str, action: &Action) -> Result<Vec<String>> {
    let args: Vec<&str> = match (kind, action) {
        (ResourceKind::Containers, Action::Start) => vec!["start", id],
        (ResourceKind::Containers, Action::Stop) => vec!["stop", id],
        (ResourceKind::Containers, Action::Restart) => vec!["restart", id],
        (ResourceKind::Containers, Action::Pause) => vec!["pause", id],
        (ResourceKind::Containers, Action::Unpause) => vec!["unpause", id],
        (ResourceKind::Containers, Action::Remove) => vec!["rm", "-f", id],
        (ResourceKind::Containers, Action::Rename(name)) => vec!["rename", id, name.as_str()],
        (ResourceKind::Images, Action::Remove) => vec!["rmi", "-f", id],
        (ResourceKind::Volumes, Action::Remove) => vec!["volume", "rm", "-f", id],
        (ResourceKind::Networks, Action::Remove) => vec!["network", "rm", id],
        (ResourceKind::Compose, Action::Up) => vec!["compose", "-p", id, "up", "-d"],
        (ResourceKind::Compose, Action::Down) => vec!["compose", "-p", id, "down"],
        (ResourceKind::Compose, Action::Remove) => vec!["compose", "-p", id, "down", "-v"],
        (ResourceKind::Compose, Action::Pause) => vec!["compose", "-p", id, "pause"],
        _ => bail!("{} is not supported for {}", action, kind),
    };
    Ok(args.into_iter().map(String::from).collect())
}

// ----------------------------------------------------------------------
// Parsing
// ----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerRecord {
    #[serde(rename = "ID")]
    id: String,
    names: String,
    state: String,
    image: String,
    #[serde(default)]
    labels: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ImageRecord {
    #[serde(rename = "ID")]
    id: String,
    #[serde(default)]
    repository: String,
    #[serde(default)]
    tag: String,
    #[serde(default)]
    size: String,
    #[serde(default)]
    created_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VolumeRecord {
    name: String,
    #[serde(default)]
    driver: String,
    #[serde(default)]
    mountpoint: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NetworkRecord {
    #[serde(rename = "ID")]
    id: String,
    name: String,
    #[serde(default)]
    driver: String,
}

#[derive(Debug, Deserialize)]
struct StatsRecord {
    #[serde(rename = "CPUPerc")]
    cpu_perc: String,
    #[serde(rename = "MemUsage")]
    mem_usage: String,
}

/// Decode one JSON document per non-empty line
fn json_lines<T: DeserializeOwned>(out: &str) -> Result<Vec<T>> {
    out.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str(line).with_context(|| format!("Failed to parse: {}", line))
        })
        .collect()
}

/// `a=b,c=d` label list as printed by `docker ps`.
///
/// Values may themselves contain commas (compose config files), so a
/// segment without `=` continues the previous value.
fn parse_labels(labels: &str) -> HashMap<&str, &str> {
    let mut map = HashMap::new();
    // key and byte offset of its value
    let mut current: Option<(&str, usize)> = None;
    let mut start = 0;

    for segment in labels.split(',') {
        if let Some((key, _)) = segment.split_once('=') {
            if let Some((prev, from)) = current.take() {
                map.insert(prev, &labels[from..start - 1]);
            }
            current = Some((key, start + key.len() + 1));
        }
        start += segment.len() + 1;
    }
    if let Some((prev, from)) = current {
        map.insert(prev, &labels[from..]);
    }
    map
}

fn short_id(id: &str) -> String {
    id.trim_start_matches("sha256:").chars().take(12).collect()
}

/// A container row plus the compose labels that do not go into the model
struct ParsedContainer {
    container: Container,
    config_files: Option<String>,
}

fn parse_containers(out: &str) -> Result<Vec<ParsedContainer>> {
    let records: Vec<ContainerRecord> = json_lines(out)?;
    Ok(records
        .into_iter()
        .map(|r| {
            let labels = parse_labels(&r.labels);
            let project = labels
                .get(COMPOSE_PROJECT_LABEL)
                .copied()
                .unwrap_or(STANDALONE_PROJECT)
                .to_string();
            let config_files = labels.get(COMPOSE_FILES_LABEL).map(|f| f.to_string());
            let container = Container {
                short_id: short_id(&r.id),
                name: r.names.trim_start_matches('/').to_string(),
                status: r.state,
                image: r.image,
                project,
                id: r.id,
                ..Default::default()
            };
            ParsedContainer {
                container,
                config_files,
            }
        })
        .collect())
}

/// Compose projects derived from container labels. A project's status is
/// the status shared by all its containers, or "mixed".
fn group_compose(containers: &[ParsedContainer]) -> Vec<ResourceItem> {
    let mut projects: BTreeMap<&str, (Option<&str>, Vec<&str>)> = BTreeMap::new();
    for parsed in containers
        .iter()
        .filter(|p| p.container.project != STANDALONE_PROJECT)
    {
        let entry = projects
            .entry(parsed.container.project.as_str())
            .or_insert((None, Vec::new()));
        if entry.0.is_none() {
            entry.0 = parsed.config_files.as_deref();
        }
        entry.1.push(parsed.container.status.as_str());
    }

    projects
        .into_iter()
        .map(|(name, (files, statuses))| {
            let first = statuses.first().copied().unwrap_or_default();
            let status = if statuses.iter().all(|s| *s == first) {
                first.to_string()
            } else {
                "mixed".to_string()
            };
            ResourceItem::Compose(ComposeProject {
                name: name.to_string(),
                config_files: files.unwrap_or("n/a").to_string(),
                status,
                selected: false,
            })
        })
        .collect()
}

fn parse_images(out: &str) -> Result<Vec<ResourceItem>> {
    let records: Vec<ImageRecord> = json_lines(out)?;

    // One row per image id; every repository:tag pointing at it is a tag
    let mut images: BTreeMap<String, Image> = BTreeMap::new();
    for r in records {
        let image = images.entry(r.id.clone()).or_insert_with(|| Image {
            short_id: short_id(&r.id),
            id: r.id.clone(),
            size_mb: parse_size_mb(&r.size).unwrap_or(0.0),
            created: r.created_at.chars().take(10).collect(),
            ..Default::default()
        });
        if r.repository != UNTAGGED && r.tag != UNTAGGED {
            image.tags.push(format!("{}:{}", r.repository, r.tag));
        }
    }

    Ok(images
        .into_values()
        .map(|mut image| {
            if image.tags.is_empty() {
                image.tags.push(UNTAGGED.to_string());
            }
            ResourceItem::Image(image)
        })
        .collect())
}

fn parse_volumes(out: &str) -> Result<Vec<ResourceItem>> {
    let records: Vec<VolumeRecord> = json_lines(out)?;
    Ok(records
        .into_iter()
        .map(|r| {
            ResourceItem::Volume(Volume {
                name: r.name,
                driver: if r.driver.is_empty() { "local".to_string() } else { r.driver },
                mountpoint: if r.mountpoint.is_empty() { "n/a".to_string() } else { r.mountpoint },
                selected: false,
            })
        })
        .collect())
}

/// `subnets[i]` belongs to `records[i]`; missing entries become "n/a"
fn build_networks(records: Vec<NetworkRecord>, subnets: &[String]) -> Vec<ResourceItem> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let subnet = subnets
                .get(i)
                .and_then(|s| s.split_whitespace().next())
                .unwrap_or("n/a")
                .to_string();
            ResourceItem::Network(Network {
                id: r.id,
                name: r.name,
                driver: r.driver,
                subnet,
                selected: false,
            })
        })
        .collect()
}

fn parse_stats(out: &str) -> Result<Metrics> {
    let records: Vec<StatsRecord> = json_lines(out)?;
    let record = records.into_iter().next().context("No stats returned")?;

    let cpu = record
        .cpu_perc
        .trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .ok();
    let memory = record
        .mem_usage
        .split('/')
        .next()
        .and_then(parse_size_mb);

    Ok(Metrics {
        cpu_percent: cpu,
        memory_mb: memory,
    })
}

/// Parse a docker size string ("187MB", "12.5MiB", "1.2GB", "512kB") into MB
fn parse_size_mb(size: &str) -> Option<f64> {
    let size = size.trim();
    let split = size
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(size.len());
    let (number, unit) = size.split_at(split);
    let value: f64 = number.parse().ok()?;

    let factor = match unit.trim() {
        "B" => 1.0 / (1024.0 * 1024.0),
        "kB" | "KB" | "KiB" => 1.0 / 1024.0,
        "" | "MB" | "MiB" => 1.0,
        "GB" | "GiB" => 1024.0,
        "TB" | "TiB" => 1024.0 * 1024.0,
        _ => return None,
    };
    Some(value * factor)
}

// ----------------------------------------------------------------------
// Log streaming
// ----------------------------------------------------------------------

/// `docker logs -f` child with one reader task per output pipe
struct DockerLogStream {
    child: Child,
    lines: mpsc::Receiver<String>,
    readers: Vec<JoinHandle<()>>,
}

impl DockerLogStream {
    fn spawn(binary: &str, id: &str, tail: usize) -> Result<Self> {
        let tail = tail.to_string();
        tracing::debug!("Executing: {} logs -f --tail {} {}", binary, tail, id);

        let mut child = Command::new(binary)
            .args(["logs", "-f", "--tail", tail.as_str(), id])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to follow logs of {}", id))?;

        let (tx, rx) = mpsc::channel(LOG_CHANNEL_SIZE);
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, tx));
        }

        Ok(Self {
            child,
            lines: rx,
            readers,
        })
    }
}

fn spawn_reader<R>(pipe: R, tx: mpsc::Sender<String>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    })
}

#[async_trait]
impl LogStream for DockerLogStream {
    async fn next_line(&mut self) -> Result<Option<String>> {
        // Closes once both pipes hit EOF
        Ok(self.lines.recv().await)
    }

    fn terminate(&mut self) {
        if let Err(e) = self.child.start_kill() {
            tracing::debug!("log stream already gone: {}", e);
        }
    }

    async fn wait(&mut self, timeout: Duration) -> bool {
        matches!(
            tokio::time::timeout(timeout, self.child.wait()).await,
            Ok(Ok(_))
        )
    }

    fn kill(&mut self) {
        let _ = self.child.start_kill();
        for reader in self.readers.drain(..) {
            reader.abort();
        }
    }
}
