//! Header Component
//!
//! Displays the resource tabs with their counts and process status.

use crate::app::App;
use crate::VERSION;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tdock::resource::ResourceKind;

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let snapshot = &app.snapshot;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" tdock v{} ", VERSION),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    // Row 1: Tabs
    let mut tabs = vec![Span::raw(" ")];
    for (idx, kind) in ResourceKind::ALL.iter().enumerate() {
        let label = format!(" {}:{}({}) ", idx + 1, kind.display_name(), snapshot.total(*kind));
        let style = if *kind == snapshot.active_kind {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        tabs.push(Span::styled(label, style));
        tabs.push(Span::raw(" "));
    }
    tabs.push(Span::styled(" 6:Stats ", Style::default().fg(Color::DarkGray)));
    f.render_widget(Paragraph::new(Line::from(tabs)), rows[0]);

    // Row 2: Status
    let mut status = vec![
        Span::styled(" tdock: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            if snapshot.self_usage.is_empty() {
                "--".to_string()
            } else {
                snapshot.self_usage.clone()
            },
            Style::default().fg(Color::White),
        ),
        Span::raw("  "),
        Span::styled("Sort: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            snapshot.sort_mode.as_str(),
            Style::default().fg(Color::Yellow),
        ),
    ];

    if snapshot.bulk_mode {
        status.push(Span::styled(
            format!("  [BULK {}]", snapshot.selected_count()),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ));
    }

    if app.readonly {
        status.push(Span::styled(
            "  [READ-ONLY]",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }

    if snapshot.update_available {
        status.push(Span::styled(
            "  Update available",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let in_progress = app.notification_manager.in_progress_count();
    if in_progress > 0 {
        status.push(Span::styled(
            format!("  ↻ {}", in_progress),
            Style::default().fg(Color::Yellow),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(status)), rows[1]);
}
