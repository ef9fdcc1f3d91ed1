//! Terminal key bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use mazeview::control::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Key),
    ToggleControl,
    ToggleGrid,
    Speed(i32),
    Quit,
}

pub const KEY_HELP: &str = "[c] control  [g] grid  [+/-] speed  [q] quit";

pub fn command_for(event: &KeyEvent) -> Option<Command> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    // Raw mode swallows SIGINT, so Ctrl-C arrives as a key.
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(event.code, KeyCode::Char('c')).then_some(Command::Quit);
    }
    match event.code {
        KeyCode::Up => Some(Command::Move(Key::ArrowUp)),
        KeyCode::Down => Some(Command::Move(Key::ArrowDown)),
        KeyCode::Left => Some(Command::Move(Key::ArrowLeft)),
        KeyCode::Right => Some(Command::Move(Key::ArrowRight)),
        KeyCode::Esc | KeyCode::Char('q') => Some(Command::Quit),
        KeyCode::Char('c') => Some(Command::ToggleControl),
        KeyCode::Char('g') => Some(Command::ToggleGrid),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Command::Speed(1)),
        KeyCode::Char('-') => Some(Command::Speed(-1)),
        KeyCode::Char(c) => Some(Command::Move(Key::from_char(c))),
        _ => None,
    }
}
