//! Event Handling
//!
//! Keyboard handling for tdock. Keys either call a store mutator directly
//! or go through [`App`] for actions, dialogs and shells.

use crate::app::{App, Mode};
use anyhow::Result;
use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use std::time::Duration;
use tdock::provider::Action;
use tdock::resource::ResourceKind;

/// Handle events, returns true if app should quit
pub async fn handle_events(app: &mut App, timeout: Duration) -> Result<bool> {
    if poll(timeout)? {
        match read()? {
            Event::Key(key) => {
                app.dirty = true;
                return handle_key_event(app, key.code, key.modifiers).await;
            },
            Event::Resize(_, _) => app.dirty = true,
            _ => {},
        }
    }
    Ok(false)
}

async fn handle_key_event(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    // Global quit shortcut
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    match app.mode {
        Mode::Normal => handle_normal_mode(app, code, modifiers).await,
        Mode::Help => handle_help_mode(app, code),
        Mode::Confirm => handle_confirm_mode(app, code).await,
        Mode::Warning => handle_warning_mode(app, code),
        Mode::Rename => handle_rename_mode(app, code, modifiers).await,
        Mode::Stats => handle_stats_mode(app, code),
        Mode::Notifications => handle_notifications_mode(app, code),
    }
}

async fn handle_normal_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    // Handle filter input first
    if app.snapshot.is_filtering {
        match code {
            KeyCode::Esc => {
                app.clear_filter();
            },
            KeyCode::Enter => {
                app.state.set_filtering(false);
            },
            KeyCode::Backspace => {
                app.pop_filter_char();
            },
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                app.push_filter_char(c);
            },
            _ => {},
        }
        return Ok(false);
    }

    let bulk = app.snapshot.bulk_mode;

    match code {
        // Quit
        KeyCode::Char('q') => return Ok(true),

        // Tabs
        KeyCode::Char(c @ '1'..='5') => {
            let idx = (c as usize) - ('1' as usize);
            app.switch_kind(ResourceKind::ALL[idx]);
        },
        KeyCode::Char('6') => app.enter_stats_mode(),
        KeyCode::Right | KeyCode::Char(']') => app.next_kind(),
        KeyCode::Left | KeyCode::Char('[') => app.previous_kind(),
        KeyCode::Tab => app.state.toggle_focus(),

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => app.move_by(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_by(-1),
        KeyCode::Home | KeyCode::Char('g') => app.go_to_top(),
        KeyCode::End | KeyCode::Char('G') => app.go_to_bottom(),
        KeyCode::PageDown => app.page_down(),
        KeyCode::PageUp => app.page_up(),

        // Filter and sort
        KeyCode::Char('/') => app.start_filter(),
        KeyCode::Esc => app.clear_filter(),
        KeyCode::Char('S') => app.state.cycle_sort_mode(),
        KeyCode::Char('R') => app.force_refresh(),

        // Bulk selection
        KeyCode::Char('b') => app.state.toggle_bulk_mode(),
        KeyCode::Char(' ') => app.state.toggle_item_selection(),
        KeyCode::Char('a') if bulk => app.state.select_all(),
        KeyCode::Char('c') if bulk => app.state.select_none(),

        // Actions
        KeyCode::Char('s') => app.request_action(Action::Start).await,
        KeyCode::Char('t') => app.request_action(Action::Stop).await,
        KeyCode::Char('r') => app.request_action(Action::Restart).await,
        KeyCode::Char('p') => app.toggle_pause().await,
        KeyCode::Char('d') => app.request_action(Action::Remove).await,
        KeyCode::Char('U') => app.request_action(Action::Up).await,
        KeyCode::Char('D') => app.request_action(Action::Down).await,
        KeyCode::Char('P') => app.request_action(Action::Prune).await,
        KeyCode::Char('n') => app.start_rename(),

        // Shells
        KeyCode::Char('x') if !bulk => app.open_shell(),
        KeyCode::Char('i') if !bulk => app.inspect_selected(),

        // Overlays
        KeyCode::Char('?') | KeyCode::Char('h') => app.enter_help_mode(),
        KeyCode::Char('N') => app.enter_notifications_mode(),

        _ => {},
    }

    Ok(false)
}

async fn handle_confirm_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
            app.exit_mode();
        },
        KeyCode::Left | KeyCode::Char('h') => {
            if let Some(ref mut pending) = app.pending_action {
                pending.selected_yes = true;
            }
        },
        KeyCode::Right | KeyCode::Char('l') => {
            if let Some(ref mut pending) = app.pending_action {
                pending.selected_yes = false;
            }
        },
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.confirm_pending(true).await;
        },
        KeyCode::Enter => {
            let accepted = app
                .pending_action
                .as_ref()
                .map(|p| p.selected_yes)
                .unwrap_or(false);
            app.confirm_pending(accepted).await;
        },
        _ => {},
    }
    Ok(false)
}

fn handle_warning_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Enter => {
            app.warning_message = None;
            app.exit_mode();
        },
        _ => {},
    }
    Ok(false)
}

async fn handle_rename_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
    match code {
        KeyCode::Esc => {
            app.exit_mode();
        },
        KeyCode::Enter => {
            app.submit_rename().await;
        },
        KeyCode::Backspace => {
            app.rename_text.pop();
        },
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            app.rename_text.push(c);
        },
        _ => {},
    }
    Ok(false)
}

fn handle_help_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Enter => {
            app.exit_mode();
        },
        _ => {},
    }
    Ok(false)
}

fn handle_stats_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('6') | KeyCode::Enter => {
            app.stats = None;
            app.exit_mode();
        },
        KeyCode::Char(c @ '1'..='5') => {
            app.stats = None;
            app.exit_mode();
            let idx = (c as usize) - ('1' as usize);
            app.switch_kind(ResourceKind::ALL[idx]);
        },
        _ => {},
    }
    Ok(false)
}

fn handle_notifications_mode(app: &mut App, code: KeyCode) -> Result<bool> {
    let count = app.notification_manager.notifications.len();
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('N') => {
            app.exit_mode();
        },
        KeyCode::Char('j') | KeyCode::Down => {
            if count > 0 {
                app.notifications_selected = (app.notifications_selected + 1).min(count - 1);
            }
        },
        KeyCode::Char('k') | KeyCode::Up => {
            app.notifications_selected = app.notifications_selected.saturating_sub(1);
        },
        KeyCode::Char('c') => {
            app.clear_notifications();
        },
        _ => {},
    }
    Ok(false)
}
