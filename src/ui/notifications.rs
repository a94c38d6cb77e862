//! Notifications Panel UI
//!
//! Renders the action history as an overlay.

use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};
use tdock::notification::NotificationStatus;

pub fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    // 80% width, 70% height
    let popup_width = (area.width as f32 * 0.8) as u16;
    let popup_height = (area.height as f32 * 0.7) as u16;
    let popup_x = (area.width - popup_width) / 2;
    let popup_y = (area.height - popup_height) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    f.render_widget(Clear, popup_area);

    let in_progress = app.notification_manager.in_progress_count();
    let title = if in_progress > 0 {
        format!(" Notifications [{} in progress] ", in_progress)
    } else {
        " Notifications ".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner_area = block.inner(popup_area);
    f.render_widget(block, popup_area);

    if app.notification_manager.notifications.is_empty() {
        let msg = Paragraph::new("No notifications yet")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(msg, inner_area);
        return;
    }

    let header_cells = [" ", " TIME", " ACTION", " TARGET", " DURATION", " DETAIL"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });
    let header = Row::new(header_cells).height(1);

    // Newest first
    let rows = app
        .notification_manager
        .notifications
        .iter()
        .map(|notif| {
            let status_color = match &notif.status {
                NotificationStatus::Pending => Color::Yellow,
                NotificationStatus::Success => Color::Green,
                NotificationStatus::Error(_) => Color::Red,
            };
            let detail = match &notif.status {
                NotificationStatus::Error(err) => err.clone(),
                _ => String::new(),
            };
            let target = if notif.target.is_empty() {
                notif.kind.display_name().to_string()
            } else {
                notif.target.clone()
            };

            Row::new(vec![
                Cell::from(format!(" {}", notif.status.icon()))
                    .style(Style::default().fg(status_color)),
                Cell::from(format!(" {}", notif.time_display())),
                Cell::from(format!(" {}", notif.action.display_name())),
                Cell::from(format!(" {}", truncate(&target, 30))),
                Cell::from(format!(" {}", notif.duration_display())),
                Cell::from(format!(" {}", truncate(&detail, 60)))
                    .style(Style::default().fg(Color::Red)),
            ])
        });

    let widths = [
        Constraint::Length(3),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(32),
        Constraint::Length(10),
        Constraint::Min(20),
    ];

    let table = Table::new(rows, widths).header(header).row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = TableState::default();
    state.select(Some(app.notifications_selected));

    f.render_stateful_widget(table, inner_area, &mut state);

    let help_area = Rect::new(
        popup_area.x + 1,
        popup_area.y + popup_area.height.saturating_sub(1),
        popup_area.width.saturating_sub(2),
        1,
    );
    let help = Line::from(vec![
        Span::styled("j/k", Style::default().fg(Color::Yellow)),
        Span::raw(": navigate  "),
        Span::styled("c", Style::default().fg(Color::Yellow)),
        Span::raw(": clear all  "),
        Span::styled("q/N/Esc", Style::default().fg(Color::Yellow)),
        Span::raw(": close"),
    ]);
    let help_para = Paragraph::new(help).alignment(Alignment::Center);
    f.render_widget(help_para, help_area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}
