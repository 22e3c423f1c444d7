//! Event handling for the TUI.
//!
//! Reads terminal events on a blocking thread and maps key presses to panel actions.

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// Application events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// The terminal was resized.
    Resize(u16, u16),
}

/// What a key press asks the UI to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Primary modifier + Enter: connect or reconnect.
    Connect,
    /// Primary modifier + L: clear the activity log.
    ClearLog,
    Quit,
    Submit,
    Insert(char),
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    HistoryPrevious,
    HistoryNext,
    ScrollUp,
    ScrollDown,
    ClearInput,
    Ignore,
}

/// Ctrl on every platform, plus Super (Cmd) where the terminal reports it.
fn has_primary_modifier(modifiers: KeyModifiers) -> bool {
    modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER)
}

/// Maps a key event to an action. Shortcuts are matched before text input, so the keys
/// they use never reach the input line.
pub fn map_key(key: KeyEvent) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::Ignore;
    }

    let primary = has_primary_modifier(key.modifiers);
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Enter if primary => KeyAction::Connect,
        // Terminals without enhanced key reporting send Ctrl+Enter as Ctrl+J.
        KeyCode::Char('j') | KeyCode::Char('J') if ctrl => KeyAction::Connect,
        KeyCode::Char('l') | KeyCode::Char('L') if primary => KeyAction::ClearLog,
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => KeyAction::Quit,
        KeyCode::Char(_) if primary => KeyAction::Ignore,
        KeyCode::Char(c) => KeyAction::Insert(c),
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Backspace => KeyAction::Backspace,
        KeyCode::Delete => KeyAction::Delete,
        KeyCode::Left => KeyAction::CursorLeft,
        KeyCode::Right => KeyAction::CursorRight,
        KeyCode::Home => KeyAction::CursorHome,
        KeyCode::End => KeyAction::CursorEnd,
        KeyCode::Up => KeyAction::HistoryPrevious,
        KeyCode::Down => KeyAction::HistoryNext,
        KeyCode::PageUp => KeyAction::ScrollUp,
        KeyCode::PageDown => KeyAction::ScrollDown,
        KeyCode::Esc => KeyAction::ClearInput,
        _ => KeyAction::Ignore,
    }
}

/// Reads terminal events on a blocking thread until `shutdown` is set.
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    /// Creates a new event handler with default tick rate.
    pub fn new() -> Self {
        Self {
            tick_rate: Duration::from_millis(100),
        }
    }

    /// Starts the reader. Events arrive on the returned channel; the reader stops once
    /// `shutdown` is set or the receiver is dropped.
    pub fn spawn(&self, shutdown: Arc<AtomicBool>) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        let tick_rate = self.tick_rate;

        tokio::task::spawn_blocking(move || {
            while !shutdown.load(Ordering::SeqCst) {
                match event::poll(tick_rate) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(e) => {
                        warn!("Failed to poll terminal events: {e}");
                        break;
                    }
                }

                let event = match event::read() {
                    Ok(CrosstermEvent::Key(key)) => Event::Key(key),
                    Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Failed to read terminal event: {e}");
                        break;
                    }
                };

                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        rx
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_connect_shortcut() {
        assert_eq!(
            map_key(key(KeyCode::Enter, KeyModifiers::CONTROL)),
            KeyAction::Connect
        );
        assert_eq!(
            map_key(key(KeyCode::Enter, KeyModifiers::SUPER)),
            KeyAction::Connect
        );
        assert_eq!(
            map_key(key(KeyCode::Char('j'), KeyModifiers::CONTROL)),
            KeyAction::Connect
        );
    }

    #[test]
    fn test_clear_log_shortcut_is_consumed() {
        assert_eq!(
            map_key(key(KeyCode::Char('l'), KeyModifiers::CONTROL)),
            KeyAction::ClearLog
        );
        assert_eq!(
            map_key(key(KeyCode::Char('l'), KeyModifiers::SUPER)),
            KeyAction::ClearLog
        );
        assert_eq!(
            map_key(key(KeyCode::Char('L'), KeyModifiers::CONTROL | KeyModifiers::SHIFT)),
            KeyAction::ClearLog
        );
    }

    #[test]
    fn test_plain_keys() {
        assert_eq!(map_key(key(KeyCode::Enter, KeyModifiers::NONE)), KeyAction::Submit);
        assert_eq!(
            map_key(key(KeyCode::Char('l'), KeyModifiers::NONE)),
            KeyAction::Insert('l')
        );
        assert_eq!(
            map_key(key(KeyCode::Char('L'), KeyModifiers::SHIFT)),
            KeyAction::Insert('L')
        );
        assert_eq!(map_key(key(KeyCode::Up, KeyModifiers::NONE)), KeyAction::HistoryPrevious);
        assert_eq!(map_key(key(KeyCode::Esc, KeyModifiers::NONE)), KeyAction::ClearInput);
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(
            map_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyAction::Quit
        );
        assert_eq!(
            map_key(key(KeyCode::Char('q'), KeyModifiers::CONTROL)),
            KeyAction::Quit
        );
    }

    #[test]
    fn test_other_modified_chars_are_ignored() {
        assert_eq!(
            map_key(key(KeyCode::Char('x'), KeyModifiers::CONTROL)),
            KeyAction::Ignore
        );
    }

    #[test]
    fn test_release_events_are_ignored() {
        let mut release = key(KeyCode::Enter, KeyModifiers::CONTROL);
        release.kind = KeyEventKind::Release;
        assert_eq!(map_key(release), KeyAction::Ignore);
    }

    #[test]
    fn test_event_handler_creation() {
        let handler = EventHandler::new();
        assert_eq!(handler.tick_rate, Duration::from_millis(100));
    }
}
