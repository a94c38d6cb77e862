//! Splash Screen
//!
//! Loading screen shown while connecting to docker and loading the first lists.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

const LOGO: [&str; 5] = [
    "  _      _            _    ",
    " | |_ __| | ___   ___| | __",
    " | __/ _` |/ _ \\ / __| |/ /",
    " | || (_| | (_) | (__|   < ",
    "  \\__\\__,_|\\___/ \\___|_|\\_\\",
];

/// Splash screen state
pub struct SplashState {
    message: String,
    completed_steps: usize,
    total_steps: usize,
}

impl SplashState {
    pub fn new(total_steps: usize) -> Self {
        Self {
            message: "Initializing...".to_string(),
            completed_steps: 0,
            total_steps: total_steps.max(1),
        }
    }

    pub fn set_message(&mut self, message: &str) {
        self.message = message.to_string();
    }

    pub fn complete_step(&mut self) {
        self.completed_steps = (self.completed_steps + 1).min(self.total_steps);
    }

    fn progress(&self) -> f64 {
        self.completed_steps as f64 / self.total_steps as f64
    }
}

pub fn render(f: &mut Frame, state: &SplashState) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Length(11),
            Constraint::Percentage(35),
        ])
        .split(area);

    let center = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(60),
            Constraint::Percentage(20),
        ])
        .split(chunks[1])[1];

    let mut logo: Vec<Line> = LOGO
        .iter()
        .map(|l| Line::from(Span::styled(*l, Style::default().fg(Color::Cyan))))
        .collect();
    logo.push(Line::from(""));
    logo.push(Line::from(Span::styled(
        "Terminal UI for Docker",
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )));

    let logo_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = logo_block.inner(center);
    f.render_widget(logo_block, center);

    let inner_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let logo_para = Paragraph::new(logo).alignment(Alignment::Center);
    f.render_widget(logo_para, inner_chunks[0]);

    let progress = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent((state.progress() * 100.0) as u16)
        .label(Span::styled(&state.message, Style::default().fg(Color::White)));

    f.render_widget(progress, inner_chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_saturates() {
        let mut state = SplashState::new(2);
        state.complete_step();
        assert!((state.progress() - 0.5).abs() < f64::EPSILON);
        state.complete_step();
        state.complete_step();
        assert!((state.progress() - 1.0).abs() < f64::EPSILON);
    }
}
