//! Event handling for TUI

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use tokio::time::{interval, Interval};

/// Application events
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Keyboard event
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// Tick event for periodic updates
    Tick,
}

/// Event handler for the TUI
pub struct EventHandler {
    stream: EventStream,
    tick: Interval,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new(tick_rate: Duration) -> Self {
        Self {
            stream: EventStream::new(),
            tick: interval(tick_rate),
        }
    }

    /// Get the next event
    pub async fn next(&mut self) -> Option<AppEvent> {
        loop {
            tokio::select! {
                _ = self.tick.tick() => return Some(AppEvent::Tick),
                maybe_event = self.stream.next() => match maybe_event {
                    Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                        return Some(AppEvent::Key(key))
                    }
                    Some(Ok(CrosstermEvent::Resize(w, h))) => return Some(AppEvent::Resize(w, h)),
                    Some(Ok(_)) => continue,
                    Some(Err(_)) | None => return None,
                },
            }
        }
    }
}

/// Helper to check for quit key combinations
pub fn is_quit_key(key: &KeyEvent) -> bool {
    matches!(
        key,
        KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            ..
        } | KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            ..
        }
    )
}
