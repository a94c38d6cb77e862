mod app;
mod event;
mod shell;
mod ui;

/// Version injected at compile time via TDOCK_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("TDOCK_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{poll, read, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tdock::cache::TtlCache;
use tdock::config::Config;
use tdock::poller::{PollerSettings, Pollers};
use tdock::provider::docker::DockerProvider;
use tdock::provider::{CachedProvider, ResourceProvider};
use tdock::resource::ResourceKind;
use tdock::state::StateStore;
use tracing_subscriber::EnvFilter;
use ui::splash::{render as render_splash, SplashState};

/// Key poll timeout of the foreground loop
const EVENT_POLL: Duration = Duration::from_millis(100);

/// Terminal UI for Docker
#[derive(Parser, Debug)]
#[command(name = "tdock", version, about, long_about = None)]
struct Args {
    /// Docker client binary to run
    #[arg(long)]
    docker: Option<String>,

    /// List poller tick in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    /// Run in read-only mode (block all write operations)
    #[arg(long)]
    readonly: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_directive(self) -> Option<&'static str> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some("error"),
            LogLevel::Warn => Some("warn"),
            LogLevel::Info => Some("info"),
            LogLevel::Debug => Some("debug"),
            LogLevel::Trace => Some("trace"),
        }
    }
}

/// Log to a file, the terminal belongs to the UI. `RUST_LOG` overrides the
/// level given on the command line.
fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let directive = level.as_directive()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        },
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("tdock started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("tdock").join("tdock.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".tdock").join("tdock.log");
    }
    PathBuf::from("tdock.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = initialize_with_splash(&mut terminal, &args).await;

    match result {
        Ok(Some((mut app, pollers))) => {
            let run_result = run_app(&mut terminal, &mut app).await;

            pollers.shutdown().await;
            let kind = app.state.active_kind();
            if let Err(e) = app.config.set_last_kind(kind) {
                tracing::warn!("Failed to save config: {}", e);
            }

            cleanup_terminal(&mut terminal)?;

            if let Err(err) = run_result {
                eprintln!("Error: {err:?}");
            }
        },
        Ok(None) => {
            cleanup_terminal(&mut terminal)?;
        },
        Err(err) => {
            cleanup_terminal(&mut terminal)?;
            eprintln!("Initialization error: {err:?}");
        },
    }

    Ok(())
}

fn cleanup_terminal<B: Backend + std::io::Write>(terminal: &mut Terminal<B>) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Build the engine behind the splash screen. Returns `None` when the user
/// aborts with Ctrl+C.
async fn initialize_with_splash<B: Backend>(
    terminal: &mut Terminal<B>,
    args: &Args,
) -> Result<Option<(App, Pollers)>>
where
    B::Error: Send + Sync + 'static,
{
    let mut splash = SplashState::new(4);

    terminal.draw(|f| render_splash(f, &splash))?;

    if check_abort()? {
        return Ok(None);
    }

    // Step 1: Load configuration
    splash.set_message("Loading configuration");
    terminal.draw(|f| render_splash(f, &splash))?;

    let mut config = Config::load();
    if let Some(docker) = &args.docker {
        config.docker.binary = docker.clone();
    }
    if let Some(tick_ms) = args.tick_ms {
        config.refresh.tick_ms = tick_ms;
    }
    splash.complete_step();

    if check_abort()? {
        return Ok(None);
    }

    // Step 2: Reach the daemon
    splash.set_message(&format!("Connecting to docker [{}]", config.docker.binary));
    terminal.draw(|f| render_splash(f, &splash))?;

    let docker = DockerProvider::new(config.docker.binary.clone())
        .with_source_dir(config.docker.source_dir.clone());
    let startup_error = match docker.server_version().await {
        Ok(version) => {
            tracing::info!("Docker server {} via {}", version, docker.binary());
            None
        },
        Err(e) => {
            tracing::warn!("Docker is not reachable: {:#}", e);
            Some(format!("Docker is not reachable: {}", e))
        },
    };
    splash.complete_step();

    if check_abort()? {
        return Ok(None);
    }

    // Step 3: Initial lists
    splash.set_message("Loading resources");
    terminal.draw(|f| render_splash(f, &splash))?;

    let cache = Arc::new(TtlCache::with_ttls(
        &config.cache.ttl_overrides(),
        config.cache.default_ttl(),
    ));
    let backend: Arc<dyn ResourceProvider> = Arc::new(docker);
    let provider = Arc::new(CachedProvider::new(backend, cache));
    let state = Arc::new(StateStore::new(config.logs.max_lines));

    if let Some(kind) = config.ui.last_kind {
        state.set_active_kind(kind);
    }
    for kind in ResourceKind::ALL {
        let items = provider.list(kind).await;
        tracing::debug!("Loaded {} {}", items.len(), kind.noun(items.len()));
        state.replace_collection(kind, items);
    }
    if let Some(err) = startup_error {
        state.set_error(err);
    }
    splash.complete_step();

    if check_abort()? {
        return Ok(None);
    }

    // Step 4: Background pollers
    splash.set_message("Starting pollers");
    terminal.draw(|f| render_splash(f, &splash))?;

    let pollers = Pollers::spawn(
        state.clone(),
        provider.clone(),
        PollerSettings::from_config(&config),
    );
    splash.complete_step();
    splash.set_message("Ready!");
    terminal.draw(|f| render_splash(f, &splash))?;

    tokio::time::sleep(Duration::from_millis(200)).await;

    let app = App::new(
        state,
        provider,
        pollers.refresh_trigger(),
        config,
        args.readonly,
    );

    Ok(Some((app, pollers)))
}

fn check_abort() -> Result<bool> {
    if poll(Duration::from_millis(50)).context("Failed to poll terminal events")? {
        if let Event::Key(key) = read()? {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Foreground loop: redraw only when the store or the screen changed
async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        app.state.clear_expired_error(app.error_display());

        if app.needs_redraw() {
            app.sync();
            terminal.draw(|f| ui::render(f, app))?;
        }

        if event::handle_events(app, EVENT_POLL).await? {
            return Ok(());
        }
    }
}
