//! Shell Integration
//!
//! Suspends the TUI to run interactive docker commands: a shell inside a
//! container, or `docker inspect` output in a pager.

use anyhow::{Context, Result};
use std::process::{Command, Stdio};
use tdock::resource::ResourceKind;

/// Exit codes docker exec uses when the requested program is missing
const EXEC_NOT_FOUND: [i32; 2] = [126, 127];

/// Result of a shell operation
#[derive(Debug)]
pub enum ShellResult {
    /// Command completed successfully
    Success,
    /// Command failed with exit code
    Failed(i32),
    /// Error launching command
    Error(String),
}

/// Open an interactive shell in a container, bash first, then sh
pub fn exec_shell(docker: &str, container_id: &str) -> ShellResult {
    let mut last = ShellResult::Error("no shell available".to_string());
    for shell in ["/bin/bash", "sh"] {
        let args = exec_args(container_id, shell);
        tracing::info!("Executing: {} {}", docker, args.join(" "));

        match execute_command(docker, &args) {
            ShellResult::Failed(code) if EXEC_NOT_FOUND.contains(&code) => {
                tracing::debug!("{} not available in {}", shell, container_id);
                last = ShellResult::Failed(code);
            },
            result => return result,
        }
    }
    last
}

fn exec_args(container_id: &str, shell: &str) -> Vec<String> {
    vec![
        "exec".to_string(),
        "-it".to_string(),
        container_id.to_string(),
        shell.to_string(),
    ]
}

/// Arguments showing the details of one item
pub fn inspect_args(kind: ResourceKind, id: &str) -> Vec<String> {
    let args: Vec<&str> = match kind {
        ResourceKind::Containers => vec!["container", "inspect", id],
        ResourceKind::Images => vec!["image", "inspect", id],
        ResourceKind::Volumes => vec!["volume", "inspect", id],
        ResourceKind::Networks => vec!["network", "inspect", id],
        ResourceKind::Compose => vec!["compose", "-p", id, "ps", "-a"],
    };
    args.into_iter().map(String::from).collect()
}

/// Show `docker inspect` output in `$PAGER` (less by default)
pub fn inspect(docker: &str, kind: ResourceKind, id: &str) -> ShellResult {
    let args = inspect_args(kind, id);
    let pager = std::env::var("PAGER").unwrap_or_else(|_| "less".to_string());
    tracing::info!("Executing: {} {} | {}", docker, args.join(" "), pager);

    let mut source = match Command::new(docker)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return ShellResult::Error(format!("Failed to execute {}: {}", docker, e)),
    };

    let Some(output) = source.stdout.take() else {
        return ShellResult::Error("Failed to capture inspect output".to_string());
    };

    let result = match Command::new(&pager)
        .stdin(Stdio::from(output))
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
    {
        Ok(mut child) => wait_child(&mut child),
        Err(e) => ShellResult::Error(format!("Failed to execute {}: {}", pager, e)),
    };

    match source.wait() {
        Ok(status) if !status.success() => ShellResult::Failed(status.code().unwrap_or(-1)),
        _ => result,
    }
}

/// Execute a command, inheriting stdio
fn execute_command(cmd: &str, args: &[String]) -> ShellResult {
    match Command::new(cmd)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
    {
        Ok(mut child) => wait_child(&mut child),
        Err(e) => ShellResult::Error(format!("Failed to execute {}: {}", cmd, e)),
    }
}

fn wait_child(child: &mut std::process::Child) -> ShellResult {
    match child.wait() {
        Ok(status) => {
            if status.success() {
                ShellResult::Success
            } else {
                ShellResult::Failed(status.code().unwrap_or(-1))
            }
        },
        Err(e) => ShellResult::Error(format!("Failed to wait for process: {}", e)),
    }
}

/// Terminal preparation for shell execution
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    /// Prepare terminal for external command
    pub fn prepare() -> Result<Self> {
        // Disable raw mode to let the subprocess handle input normally
        crossterm::terminal::disable_raw_mode().context("Failed to disable raw mode")?;

        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::event::DisableMouseCapture
        )
        .context("Failed to leave alternate screen")?;

        Ok(Self { _private: () })
    }

    /// Restore terminal after command completes
    pub fn restore(self) -> Result<()> {
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::event::EnableMouseCapture
        )
        .context("Failed to enter alternate screen")?;

        crossterm::terminal::enable_raw_mode().context("Failed to enable raw mode")?;

        Ok(())
    }
}

/// Execute a shell command with terminal handling
pub fn execute_with_terminal_handling<F>(pause_after: bool, f: F) -> Result<ShellResult>
where
    F: FnOnce() -> ShellResult,
{
    let guard = TerminalGuard::prepare()?;

    // Clear the screen before running command
    print!("\x1B[2J\x1B[H");
    std::io::Write::flush(&mut std::io::stdout())?;

    let result = f();

    if pause_after && matches!(result, ShellResult::Success | ShellResult::Failed(_)) {
        println!("\nPress Enter to return to tdock...");
        let mut input = String::new();
        let _ = std::io::stdin().read_line(&mut input);
    }

    guard.restore()?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_args() {
        assert_eq!(exec_args("abc", "sh"), vec!["exec", "-it", "abc", "sh"]);
    }

    #[test]
    fn test_inspect_args_per_kind() {
        assert_eq!(
            inspect_args(ResourceKind::Volumes, "data"),
            vec!["volume", "inspect", "data"]
        );
        assert_eq!(
            inspect_args(ResourceKind::Compose, "shop"),
            vec!["compose", "-p", "shop", "ps", "-a"]
        );
    }

    #[test]
    fn test_missing_binary_is_reported() {
        let result = execute_command("tdock-definitely-missing-binary", &[]);
        assert!(matches!(result, ShellResult::Error(_)));
    }
}
