use ratatui::style::{Color, Style, Stylize};
use recall_core::Difficulty;

pub fn title_style() -> Style { Style::default().fg(Color::Cyan).bold() }
pub fn hint_style() -> Style { Style::default().fg(Color::DarkGray) }
pub fn selected_style() -> Style { Style::default().fg(Color::Yellow).bold() }
pub fn footer_style() -> Style { Style::default().fg(Color::Gray) }

pub fn difficulty_style(d: Difficulty) -> Style {
    match d {
        Difficulty::Hard => Style::default().fg(Color::Red),
        Difficulty::Medium => Style::default().fg(Color::Yellow),
        Difficulty::Easy => Style::default().fg(Color::Green),
    }
}
