use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use recall_core::Quality;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Up,
    Down,
    Enter,
    ToggleReveal,
    Rate(Quality),
    Skip,
    ResetSelected,
    Confirm,
    Cancel,
    None,
}

pub fn map_event(ev: Event) -> Action {
    if let Event::Key(KeyEvent {
        code, modifiers, kind, ..
    }) = ev
    {
        if kind == KeyEventKind::Release {
            return Action::None;
        }
        match (code, modifiers) {
            (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => Action::Quit,
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => Action::Up,
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => Action::Down,
            (KeyCode::Enter, _) => Action::Enter,
            (KeyCode::Char(' '), _) => Action::ToggleReveal,
            (KeyCode::Char('1'), _) | (KeyCode::Char('h'), _) => Action::Rate(Quality::HARD),
            (KeyCode::Char('3'), _) | (KeyCode::Char('g'), _) => Action::Rate(Quality::GOOD),
            (KeyCode::Char('5'), _) | (KeyCode::Char('e'), _) => Action::Rate(Quality::EASY),
            (KeyCode::Char('s'), KeyModifiers::NONE) => Action::Skip,
            (KeyCode::Char('r'), KeyModifiers::NONE) => Action::ResetSelected,
            (KeyCode::Char('y'), KeyModifiers::NONE) => Action::Confirm,
            (KeyCode::Char('n'), KeyModifiers::NONE) => Action::Cancel,
            _ => Action::None,
        }
    } else {
        Action::None
    }
}
