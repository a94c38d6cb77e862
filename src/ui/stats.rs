//! Dashboard Statistics Overlay
//!
//! Aggregates computed by [`DashboardStats`] when the overlay was opened.

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::collections::BTreeMap;
use tdock::resource::format_size_mb;
use tdock::stats::{DashboardStats, SIZE_BUCKETS};

const BAR_WIDTH: usize = 20;

pub fn render(f: &mut Frame, app: &App) {
    let area = f.area();
    let popup_area = centered_rect(80, 80, area);

    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Dashboard ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let Some(stats) = &app.stats else {
        f.render_widget(Paragraph::new("No statistics collected"), inner);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    f.render_widget(Paragraph::new(left_column(stats)), columns[0]);
    f.render_widget(Paragraph::new(right_column(stats)), columns[1]);
}

fn left_column(stats: &DashboardStats) -> Vec<Line<'static>> {
    let c = &stats.containers;
    let mut lines = vec![
        heading("Containers"),
        value_line("Total", c.total.to_string()),
        bar_line("Running", c.running, c.total, Color::Green),
        bar_line("Stopped", c.stopped, c.total, Color::Red),
        bar_line("Paused", c.paused, c.total, Color::Yellow),
        value_line("CPU total", format!("{:.1}%", c.total_cpu)),
        value_line("CPU avg", format!("{:.1}%", c.avg_cpu)),
        value_line("MEM total", format_size_mb(c.total_memory_mb)),
        value_line("MEM avg", format_size_mb(c.avg_memory_mb)),
        Line::from(""),
        heading("Projects"),
    ];
    lines.extend(count_lines(&c.projects, c.total, Color::Cyan));
    lines.push(Line::from(""));

    lines.push(heading("tdock process"));
    lines.push(value_line("CPU", format!("{:.1}%", stats.system.cpu_percent)));
    lines.push(value_line("MEM", format_size_mb(stats.system.memory_mb)));
    lines
}

fn right_column(stats: &DashboardStats) -> Vec<Line<'static>> {
    let i = &stats.images;
    let mut lines = vec![
        heading("Images"),
        value_line("Total", i.total.to_string()),
        value_line("Size", format_size_mb(i.total_size_mb)),
        value_line("Avg size", format_size_mb(i.avg_size_mb)),
        value_line("Tagged", format!("{} / untagged {}", i.tagged, i.untagged)),
    ];
    for (label, count) in SIZE_BUCKETS.iter().zip(i.size_distribution) {
        lines.push(bar_line(label, count, i.total, Color::Blue));
    }
    lines.push(Line::from(""));

    lines.push(heading("Volumes"));
    lines.extend(count_lines(&stats.volumes.drivers, stats.volumes.total, Color::Cyan));
    lines.push(heading("Networks"));
    lines.extend(count_lines(&stats.networks.drivers, stats.networks.total, Color::Cyan));
    lines.push(heading("Compose"));
    lines.extend(count_lines(&stats.compose.by_status, stats.compose.total, Color::Green));
    lines.push(Line::from(""));

    lines.push(heading("Cache"));
    match &stats.cache {
        Some(cache) => {
            lines.push(value_line("Entries", cache.size.to_string()));
            lines.push(value_line(
                "Hits/misses",
                format!("{} / {}", cache.hits, cache.misses),
            ));
            lines.push(value_line("Hit rate", format!("{:.1}%", cache.hit_rate())));
            lines.push(value_line("Evictions", cache.evictions.to_string()));
        },
        None => lines.push(value_line("Entries", "--".to_string())),
    }
    lines
}

fn heading(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))
}

fn value_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", label), Style::default().fg(Color::DarkGray)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

fn bar_line(label: &str, count: usize, total: usize, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", label), Style::default().fg(Color::DarkGray)),
        Span::styled(bar(count, total), Style::default().fg(color)),
        Span::raw(format!(" {}", count)),
    ])
}

fn count_lines(counts: &BTreeMap<String, usize>, total: usize, color: Color) -> Vec<Line<'static>> {
    if counts.is_empty() {
        return vec![value_line("none", String::new())];
    }
    counts
        .iter()
        .map(|(name, count)| bar_line(name, *count, total, color))
        .collect()
}

/// Proportional bar, padded to a fixed width
fn bar(count: usize, total: usize) -> String {
    let filled = if total == 0 {
        0
    } else {
        ((count * BAR_WIDTH) + total / 2) / total
    };
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
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
