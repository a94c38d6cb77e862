//! Help Overlay
//!
//! Shows keyboard shortcuts.

use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const NAVIGATION: &[(&str, &str)] = &[
    ("1-5, ←/→, [/]", "Switch resource tab"),
    ("6", "Dashboard statistics"),
    ("j/k, ↑/↓", "Move up/down (scroll logs when focused)"),
    ("g/G, Home/End", "Go to top/bottom"),
    ("PgUp/PgDn", "Page up/down"),
    ("Tab", "Toggle list/details focus"),
];

const VIEW: &[(&str, &str)] = &[
    ("/", "Filter all lists"),
    ("Esc", "Clear filter"),
    ("S", "Cycle container sort (name/status/cpu)"),
    ("R", "Force refresh"),
    ("N", "Notification history"),
];

const ACTIONS: &[(&str, &str)] = &[
    ("s / t / r", "Start / stop / restart"),
    ("p", "Pause or unpause"),
    ("U / D", "Compose up / down"),
    ("n", "Rename container"),
    ("x", "Shell into container"),
    ("i", "Inspect in pager"),
];

const DESTRUCTIVE: &[(&str, &str)] = &[("d", "Remove"), ("P", "Prune unused resources")];

const BULK: &[(&str, &str)] = &[
    ("b", "Toggle bulk mode"),
    ("space", "Toggle row selection"),
    ("a / c", "Select all visible / none"),
];

pub fn render(f: &mut Frame, app: &App) {
    let area = f.area();
    let popup_area = centered_rect(70, 85, area);

    f.render_widget(Clear, popup_area);

    let mut help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    section(&mut help_text, "Navigation", NAVIGATION, Color::Yellow);
    section(&mut help_text, "View", VIEW, Color::Yellow);
    section(&mut help_text, "Actions", ACTIONS, Color::Yellow);
    section(&mut help_text, "Destructive", DESTRUCTIVE, Color::Red);
    section(&mut help_text, "Bulk", BULK, Color::Magenta);

    if app.readonly {
        help_text.push(Line::from(Span::styled(
            "Read-only mode: actions are disabled",
            Style::default().fg(Color::Yellow),
        )));
        help_text.push(Line::from(""));
    }

    help_text.push(key_line("?/Esc", "Close help", Color::Yellow));
    help_text.push(key_line("q, Ctrl+c", "Quit application", Color::Yellow));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Help ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left);

    f.render_widget(paragraph, popup_area);
}

fn section(
    lines: &mut Vec<Line<'static>>,
    title: &'static str,
    keys: &[(&'static str, &'static str)],
    color: Color,
) {
    lines.push(Line::from(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.extend(keys.iter().map(|&(key, desc)| key_line(key, desc, color)));
    lines.push(Line::from(""));
}

fn key_line(key: &'static str, desc: &'static str, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<16}", key), Style::default().fg(color)),
        Span::raw(desc),
    ])
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
