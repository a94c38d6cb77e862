//! Dialog Components
//!
//! Confirmation, warning and rename dialogs.

use crate::app::{App, Mode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use tdock::provider::Action;
use tdock::resource::ResourceKind;

pub fn render(f: &mut Frame, app: &App) {
    match app.mode {
        Mode::Confirm => render_confirm_dialog(f, app),
        Mode::Warning => render_warning_dialog(f, app),
        Mode::Rename => render_rename_dialog(f, app),
        _ => {},
    }
}

/// Most target names listed before collapsing into "+N more"
const MAX_LISTED_TARGETS: usize = 5;

/// Clear an area in the middle of the screen and draw a titled frame
/// around it. Returns the area inside the border.
fn popup(f: &mut Frame, width: u16, height: u16, title: &str, color: Color) -> Rect {
    let area = centered_rect(width, height, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);
    inner
}

fn render_confirm_dialog(f: &mut Frame, app: &App) {
    let Some(pending) = &app.pending_action else {
        return;
    };

    let accent = if pending.destructive { Color::Red } else { Color::Yellow };
    let listed = target_lines(&pending.targets, MAX_LISTED_TARGETS);
    let height = if listed.is_empty() { 30 } else { 45 };
    let inner = popup(f, 56, height, pending.action.display_name(), accent);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            pending.message.as_str(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
    ];
    if !listed.is_empty() {
        lines.push(Line::from(""));
        lines.extend(
            listed
                .into_iter()
                .map(|name| Line::from(Span::styled(name, Style::default().fg(Color::Cyan)))),
        );
    }
    if let Some(note) = consequence(&pending.action, pending.kind) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(note, Style::default().fg(Color::DarkGray))));
    }

    let buttons_row = inner.height.saturating_sub(1);
    let text_area = Rect { height: buttons_row, ..inner };
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        text_area,
    );

    let (yes, no) = button_styles(pending.selected_yes, accent);
    let buttons = Line::from(vec![
        Span::styled(" Yes (y) ", yes),
        Span::raw("    "),
        Span::styled(" No (n) ", no),
    ]);
    let buttons_area = Rect {
        y: inner.y + buttons_row,
        height: 1,
        ..inner
    };
    f.render_widget(Paragraph::new(buttons).alignment(Alignment::Center), buttons_area);
}

fn button_styles(selected_yes: bool, accent: Color) -> (Style, Style) {
    let active = |bg: Color| Style::default().fg(Color::Black).bg(bg).add_modifier(Modifier::BOLD);
    let idle = Style::default().fg(Color::DarkGray);
    if selected_yes {
        (active(accent), idle)
    } else {
        (idle, active(Color::White))
    }
}

/// Bullet list of target names, capped at `max` entries
fn target_lines(targets: &[String], max: usize) -> Vec<String> {
    let mut lines: Vec<String> = targets.iter().take(max).map(|t| format!("• {}", t)).collect();
    if targets.len() > max {
        lines.push(format!("+{} more", targets.len() - max));
    }
    lines
}

/// What the daemon does beyond the obvious
fn consequence(action: &Action, kind: ResourceKind) -> Option<&'static str> {
    match (action, kind) {
        (Action::Stop, ResourceKind::Containers) => Some("Processes get SIGTERM, then SIGKILL after the grace period"),
        (Action::Remove, ResourceKind::Containers) => Some("The writable layer of each container is deleted"),
        (Action::Remove, ResourceKind::Images) => Some("Images still used by a container are refused"),
        (Action::Remove, ResourceKind::Volumes) => Some("Data stored in the volumes cannot be recovered"),
        (Action::Remove, ResourceKind::Networks) => Some("Networks with attached containers are refused"),
        (Action::Down, _) => Some("Project containers and networks are removed; named volumes stay"),
        (Action::Remove, ResourceKind::Compose) => {
            Some("Project containers and networks are removed along with named volumes")
        },
        (Action::Prune, _) => Some("Runs container, image, volume and network prune in turn"),
        _ => None,
    }
}

fn render_warning_dialog(f: &mut Frame, app: &App) {
    let Some(message) = &app.warning_message else {
        return;
    };

    let inner = popup(f, 50, 20, "Warning", Color::Yellow);
    let content = vec![
        Line::from(""),
        Line::from(Span::styled(message.as_str(), Style::default().fg(Color::White))),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter or Esc to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(content).alignment(Alignment::Center), inner);
}

/// Single line input for a new container name
fn render_rename_dialog(f: &mut Frame, app: &App) {
    let inner = popup(f, 50, 20, "Rename Container", Color::Cyan);

    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("New name: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{}_", app.rename_text),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Enter: rename | Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    f.render_widget(Paragraph::new(content).alignment(Alignment::Center), inner);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_lines_collapse_overflow() {
        let names: Vec<String> = (1..=7).map(|i| format!("web-{}", i)).collect();
        let lines = target_lines(&names, 5);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "• web-1");
        assert_eq!(lines[5], "+2 more");

        assert!(target_lines(&[], 5).is_empty());
    }

    #[test]
    fn test_volume_removal_warns_about_data() {
        assert!(consequence(&Action::Remove, ResourceKind::Volumes)
            .is_some_and(|note| note.contains("Data")));
        assert!(consequence(&Action::Start, ResourceKind::Containers).is_none());
    }
}
