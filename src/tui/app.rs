use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ttodo::{Key, Session};

/// TUI application state: the session plus refresh bookkeeping
pub struct App {
    pub session: Session,
    refresh_interval: Duration,
    last_refresh: Instant,
}

impl App {
    pub fn new(session: Session, refresh_interval: Duration) -> Self {
        Self {
            session,
            refresh_interval,
            last_refresh: Instant::now(),
        }
    }

    /// Reload data if the refresh interval has elapsed, so background
    /// archive sweeps show up without user input
    pub fn maybe_refresh(&mut self) {
        if self.last_refresh.elapsed() < self.refresh_interval {
            return;
        }
        self.last_refresh = Instant::now();
        if let Err(e) = self.session.refresh() {
            self.session.report(e);
        }
    }

    pub fn handle_key_event(&mut self, event: KeyEvent) {
        if let Some(key) = map_key(event) {
            self.session.handle_key(key);
        }
    }

    pub fn should_quit(&self) -> bool {
        self.session.should_quit()
    }
}

/// Translate a crossterm key event. Releases are only interesting for Space.
pub fn map_key(event: KeyEvent) -> Option<Key> {
    if event.kind == KeyEventKind::Release {
        return match event.code {
            KeyCode::Char(' ') => Some(Key::SpaceReleased),
            _ => None,
        };
    }
    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
    match event.code {
        KeyCode::Char('c') if ctrl => Some(Key::Interrupt),
        KeyCode::Char(_) if ctrl || event.modifiers.contains(KeyModifiers::ALT) => None,
        KeyCode::Char(c) => Some(Key::Char(c)),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Esc),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        _ => None,
    }
}
