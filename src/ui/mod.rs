//! Terminal User Interface rendering module
//!
//! Draws the last [`Snapshot`](tdock::state::Snapshot) taken by the app
//! with ratatui. Nothing here touches the store; page heights measured while
//! drawing are written back to the app for the next key press.
//!
//! # Architecture
//!
//! - [`splash`] - Startup splash screen
//! - `header` - Tabs, counts and process usage
//! - `help` - Help overlay showing keybindings
//! - `dialog` - Confirmation, warning and rename dialogs
//! - `notifications` - Action history panel
//! - `stats` - Dashboard statistics overlay
//!
//! # Virtual Scrolling
//!
//! The list only renders the rows between the store's scroll offset and the
//! page height, with a scrollbar indicating position.

mod dialog;
mod header;
mod help;
mod notifications;
pub mod splash;
mod stats;

use crate::app::{App, Mode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState,
        Table, TableState,
    },
    Frame,
};
use tdock::notification::NotificationStatus;
use tdock::resource::{format_size_mb, ResourceItem, ResourceKind};
use tdock::state::{FocusedPane, Snapshot, LOGS_FOLLOW};

pub fn render(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(1),    // List and details
            Constraint::Length(1), // Status line
        ])
        .split(f.area());

    header::render(f, app, chunks[0]);
    render_main_content(f, app, chunks[1]);
    render_crumb(f, app, chunks[2]);

    // Overlays
    match app.mode {
        Mode::Help => {
            help::render(f, app);
        },
        Mode::Confirm | Mode::Warning | Mode::Rename => {
            dialog::render(f, app);
        },
        Mode::Notifications => {
            notifications::render(f, app);
        },
        Mode::Stats => {
            stats::render(f, app);
        },
        Mode::Normal => {},
    }
}

fn render_main_content(f: &mut Frame, app: &mut App, area: Rect) {
    let panes = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let show_filter = app.snapshot.is_filtering || !app.snapshot.filter_text.is_empty();
    if show_filter {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(panes[0]);

        render_filter_bar(f, &app.snapshot, chunks[0]);
        render_list(f, app, chunks[1]);
    } else {
        render_list(f, app, panes[0]);
    }

    render_details(f, app, panes[1]);
}

fn render_filter_bar(f: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let cursor_style = if snapshot.is_filtering {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let filter_display = if snapshot.is_filtering {
        format!("/{}_", snapshot.filter_text)
    } else {
        format!("/{}", snapshot.filter_text)
    };

    let paragraph = Paragraph::new(Line::from(vec![Span::styled(filter_display, cursor_style)]));
    f.render_widget(paragraph, area);
}

fn pane_border(focused: bool, bulk: bool) -> Style {
    if bulk {
        Style::default().fg(Color::Magenta)
    } else if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

/// Render the active kind's rows, only those on screen
fn render_list(f: &mut Frame, app: &mut App, area: Rect) {
    let snapshot = &app.snapshot;
    let kind = snapshot.active_kind;
    let items = snapshot.active_items();

    let title = {
        let count = items.len();
        let total = snapshot.total(kind);
        let selection_info = if snapshot.bulk_mode {
            format!(" [{}✓]", snapshot.selected_count())
        } else {
            String::new()
        };
        let sort_info = if kind == ResourceKind::Containers {
            format!(" sort:{}", snapshot.sort_mode.as_str())
        } else {
            String::new()
        };

        if snapshot.filter_text.is_empty() {
            format!(" {}[{}]{}{} ", kind.display_name(), count, selection_info, sort_info)
        } else {
            format!(
                " {}[{}/{}]{}{} ",
                kind.display_name(),
                count,
                total,
                selection_info,
                sort_info
            )
        }
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(pane_border(
            snapshot.focused_pane == FocusedPane::List,
            snapshot.bulk_mode,
        ))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    // Account for header row
    let visible_height = (inner_area.height as usize).saturating_sub(1).max(1);

    let total_items = items.len();
    let needs_scrollbar = total_items > visible_height;

    let table_area = if needs_scrollbar {
        Rect {
            width: inner_area.width.saturating_sub(1),
            ..inner_area
        }
    } else {
        inner_area
    };

    let start = snapshot.scroll_offset.min(total_items);
    let end = (start + visible_height).min(total_items);

    let columns = columns_for(kind);
    let mut header_cells = Vec::new();
    if snapshot.bulk_mode {
        header_cells.push(Cell::from(" "));
    }
    header_cells.extend(columns.iter().map(|(header, _)| {
        Cell::from(format!(" {}", header)).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = items[start..end]
        .iter()
        .map(|item| {
            let mut cells: Vec<Cell> = Vec::new();

            if snapshot.bulk_mode {
                let (indicator, style) = if item.is_selected() {
                    (
                        "●",
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    (" ", Style::default().fg(Color::DarkGray))
                };
                cells.push(Cell::from(format!(" {}", indicator)).style(style));
            }

            cells.extend(row_values(item).into_iter().map(|(value, style)| {
                let style = if item.is_selected() {
                    style.bg(Color::Rgb(40, 60, 40))
                } else {
                    style
                };
                Cell::from(format!(" {}", truncate_string(&value, 38))).style(style)
            }));

            Row::new(cells)
        })
        .collect();

    let mut widths: Vec<Constraint> = Vec::new();
    if snapshot.bulk_mode {
        widths.push(Constraint::Length(3));
    }
    widths.extend(columns.iter().map(|(_, pct)| Constraint::Percentage(*pct)));

    let table = Table::new(rows, widths).header(header).row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = TableState::default();
    if snapshot.selected_index >= start && snapshot.selected_index < end {
        state.select(Some(snapshot.selected_index - start));
    }

    f.render_stateful_widget(table, table_area, &mut state);

    if needs_scrollbar {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .symbols(symbols::scrollbar::VERTICAL)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));

        let mut scrollbar_state = ScrollbarState::new(total_items.saturating_sub(visible_height))
            .position(snapshot.scroll_offset);

        f.render_stateful_widget(scrollbar, inner_area, &mut scrollbar_state);
    }

    app.list_page_height = visible_height;
}

/// Column headers and width percentages per kind
fn columns_for(kind: ResourceKind) -> &'static [(&'static str, u16)] {
    match kind {
        ResourceKind::Containers => &[
            ("NAME", 22),
            ("IMAGE", 24),
            ("STATUS", 12),
            ("CPU", 10),
            ("MEM", 12),
            ("PROJECT", 18),
        ],
        ResourceKind::Images => &[("ID", 18), ("TAGS", 42), ("SIZE", 14), ("CREATED", 24)],
        ResourceKind::Volumes => &[("NAME", 35), ("DRIVER", 15), ("MOUNTPOINT", 50)],
        ResourceKind::Networks => &[("ID", 18), ("NAME", 30), ("DRIVER", 16), ("SUBNET", 34)],
        ResourceKind::Compose => &[("PROJECT", 30), ("STATUS", 16), ("CONFIG FILES", 54)],
    }
}

fn row_values(item: &ResourceItem) -> Vec<(String, Style)> {
    let plain = Style::default();
    match item {
        ResourceItem::Container(c) => vec![
            (c.name.clone(), plain),
            (c.image.clone(), plain),
            (c.status.clone(), status_style(&c.status)),
            (c.metrics.cpu_display(), plain),
            (c.metrics.memory_display(), plain),
            (c.project.clone(), Style::default().fg(Color::DarkGray)),
        ],
        ResourceItem::Image(i) => vec![
            (i.short_id.clone(), Style::default().fg(Color::DarkGray)),
            (i.tags.join(", "), plain),
            (format_size_mb(i.size_mb), plain),
            (i.created.clone(), plain),
        ],
        ResourceItem::Volume(v) => vec![
            (v.name.clone(), plain),
            (v.driver.clone(), plain),
            (v.mountpoint.clone(), Style::default().fg(Color::DarkGray)),
        ],
        ResourceItem::Network(n) => vec![
            (n.id.chars().take(12).collect(), Style::default().fg(Color::DarkGray)),
            (n.name.clone(), plain),
            (n.driver.clone(), plain),
            (n.subnet.clone(), plain),
        ],
        ResourceItem::Compose(p) => vec![
            (p.name.clone(), plain),
            (p.status.clone(), status_style(&p.status)),
            (p.config_files.clone(), Style::default().fg(Color::DarkGray)),
        ],
    }
}

/// Color for container and compose states
fn status_style(status: &str) -> Style {
    let color = match status {
        "running" => Color::Green,
        "paused" | "restarting" | "mixed" => Color::Yellow,
        "exited" | "dead" => Color::Red,
        _ => Color::DarkGray,
    };
    Style::default().fg(color)
}

/// Details of the row under the cursor; containers add their log stream
fn render_details(f: &mut Frame, app: &mut App, area: Rect) {
    let snapshot = &app.snapshot;
    let focused = snapshot.focused_pane == FocusedPane::Details;

    let title = match snapshot.selected_item() {
        Some(item) => format!(" {} ", item.display_name()),
        None => " Details ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(pane_border(focused, false))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(item) = snapshot.selected_item() else {
        let msg = Paragraph::new("Nothing selected").style(Style::default().fg(Color::DarkGray));
        f.render_widget(msg, inner);
        return;
    };

    let info = detail_lines(item);
    if !snapshot.active_kind.has_logs() {
        f.render_widget(Paragraph::new(info), inner);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(info.len() as u16 + 1), Constraint::Min(1)])
        .split(inner);
    f.render_widget(Paragraph::new(info), chunks[0]);

    let page = (chunks[1].height as usize).max(1);
    let range = log_window(snapshot.logs.len(), snapshot.logs_scroll_offset, page);
    let lines: Vec<Line> = snapshot.logs[range]
        .iter()
        .map(|l| Line::from(Span::raw(l.clone())))
        .collect();
    f.render_widget(Paragraph::new(lines), chunks[1]);

    app.logs_page_height = page;
}

/// Visible slice of the log buffer. `LOGS_FOLLOW` pins the last page.
fn log_window(len: usize, offset: usize, page: usize) -> std::ops::Range<usize> {
    let last_page = len.saturating_sub(page);
    let start = if offset == LOGS_FOLLOW {
        last_page
    } else {
        offset.min(last_page)
    };
    start..(start + page).min(len)
}

fn detail_lines(item: &ResourceItem) -> Vec<Line<'static>> {
    let field = |name: &str, value: String| {
        Line::from(vec![
            Span::styled(format!(" {}: ", name), Style::default().fg(Color::DarkGray)),
            Span::styled(value, Style::default().fg(Color::White)),
        ])
    };

    match item {
        ResourceItem::Container(c) => vec![
            Line::from(vec![
                Span::styled(" ID: ", Style::default().fg(Color::DarkGray)),
                Span::raw(c.short_id.clone()),
                Span::styled("  Image: ", Style::default().fg(Color::DarkGray)),
                Span::raw(c.image.clone()),
                Span::styled("  Status: ", Style::default().fg(Color::DarkGray)),
                Span::styled(c.status.clone(), status_style(&c.status)),
            ]),
            Line::from(vec![
                Span::styled(" CPU: ", Style::default().fg(Color::DarkGray)),
                Span::raw(c.metrics.cpu_display()),
                Span::styled("  MEM: ", Style::default().fg(Color::DarkGray)),
                Span::raw(c.metrics.memory_display()),
                Span::styled("  Project: ", Style::default().fg(Color::DarkGray)),
                Span::raw(c.project.clone()),
            ]),
        ],
        ResourceItem::Image(i) => vec![
            field("ID", i.id.clone()),
            field("Tags", i.tags.join(", ")),
            field("Size", format_size_mb(i.size_mb)),
            field("Created", i.created.clone()),
        ],
        ResourceItem::Volume(v) => vec![
            field("Name", v.name.clone()),
            field("Driver", v.driver.clone()),
            field("Mountpoint", v.mountpoint.clone()),
        ],
        ResourceItem::Network(n) => vec![
            field("ID", n.id.clone()),
            field("Name", n.name.clone()),
            field("Driver", n.driver.clone()),
            field("Subnet", n.subnet.clone()),
        ],
        ResourceItem::Compose(p) => vec![
            field("Project", p.name.clone()),
            field("Status", p.status.clone()),
            field("Config", p.config_files.clone()),
        ],
    }
}

/// Truncate string for display (Unicode-safe)
fn truncate_string(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_len {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

fn render_crumb(f: &mut Frame, app: &App, area: Rect) {
    let snapshot = &app.snapshot;

    let toast = app.notification_manager.current_toast();
    let toast_text = toast.map(|notif| notif.toast_message(app.notification_manager.detail_level));

    // Build notification indicator
    let notification_indicator = {
        let errors = app.notification_manager.error_count();
        let total = app.notification_manager.notifications.len();
        if errors > 0 {
            format!(" [✗{}]", errors)
        } else if total > 0 {
            " [N]".to_string()
        } else {
            String::new()
        }
    };

    let status_text = if let Some(err) = &snapshot.last_error {
        format!("Error: {}", err)
    } else if let Some(ref toast) = toast_text {
        toast.clone()
    } else if let Some(message) = &snapshot.message {
        message.clone()
    } else if snapshot.is_filtering {
        "Type to filter | Enter: apply | Esc: clear".to_string()
    } else if snapshot.bulk_mode {
        "space: toggle | a: all | c: none | s/t/r/d: run on selection | b: leave bulk".to_string()
    } else {
        "?: help".to_string()
    };

    let style = if snapshot.last_error.is_some() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else if let Some(notif) = toast {
        match &notif.status {
            NotificationStatus::Success => Style::default().fg(Color::Green),
            NotificationStatus::Error(_) => Style::default().fg(Color::Red),
            NotificationStatus::Pending => Style::default().fg(Color::Yellow),
        }
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let crumb = Line::from(vec![
        Span::styled(
            format!("<{}>", snapshot.active_kind.display_name().to_lowercase()),
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::raw(" "),
        Span::styled(status_text, style),
        Span::styled(notification_indicator, Style::default().fg(Color::DarkGray)),
    ]);

    f.render_widget(Paragraph::new(crumb), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_window_follows_tail() {
        assert_eq!(log_window(100, LOGS_FOLLOW, 10), 90..100);
        assert_eq!(log_window(5, LOGS_FOLLOW, 10), 0..5);
    }

    #[test]
    fn test_log_window_clamps_offset() {
        assert_eq!(log_window(100, 20, 10), 20..30);
        assert_eq!(log_window(100, 95, 10), 90..100);
        assert_eq!(log_window(0, 3, 10), 0..0);
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("a-very-long-container-name", 10), "a-very-...");
    }
}
