//! Event handling for the TUI.
//!
//! Processes keyboard and terminal events using crossterm.

use crate::error::{AppError, Result};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::time::Duration;

/// Application events.
#[derive(Debug, Clone)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// The terminal was resized.
    Resize(u16, u16),
    /// A periodic tick (for the spinner animation).
    Tick,
}

/// How long to wait for a terminal event before emitting a tick.
pub const TICK_RATE: Duration = Duration::from_millis(100);

/// Converts a crossterm event into an application event.
pub fn from_crossterm(event: CrosstermEvent) -> Event {
    match event {
        CrosstermEvent::Key(key) => Event::Key(key),
        CrosstermEvent::Resize(width, height) => Event::Resize(width, height),
        _ => Event::Tick,
    }
}

/// Polls for the next terminal event, blocking up to [`TICK_RATE`].
///
/// Returns `Event::Tick` when nothing happened, so the caller always gets a
/// chance to redraw.
pub fn poll_next() -> Result<Event> {
    if event::poll(TICK_RATE)
        .map_err(|e| AppError::internal(format!("Failed to poll events: {e}")))?
    {
        let event =
            event::read().map_err(|e| AppError::internal(format!("Failed to read event: {e}")))?;
        Ok(from_crossterm(event))
    } else {
        Ok(Event::Tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn test_from_crossterm_key() {
        let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        let event = from_crossterm(CrosstermEvent::Key(key));
        assert!(matches!(event, Event::Key(k) if k.code == KeyCode::Char('a')));
    }

    #[test]
    fn test_from_crossterm_resize() {
        let event = from_crossterm(CrosstermEvent::Resize(80, 24));
        assert!(matches!(event, Event::Resize(80, 24)));
    }
}
