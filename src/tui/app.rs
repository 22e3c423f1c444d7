//! TUI application state.
//!
//! Holds what only the terminal needs: the input line, its history, scroll position and
//! the count of device calls still in flight. Device state lives in [`crate::app::Panel`].

use super::events::KeyAction;
use super::widgets::spinner::Spinner;

/// Maximum number of remembered input lines.
const MAX_HISTORY: usize = 100;

/// Lines moved per PageUp/PageDown.
const SCROLL_STEP: u16 = 5;

/// Input line with a cursor counted in characters.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    text: String,
    cursor: usize,
}

impl InputState {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Replaces the text and puts the cursor at the end.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.char_len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Takes the text, leaving the input empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }
}

/// Previously submitted lines, browsed with Up/Down.
#[derive(Debug, Clone, Default)]
pub struct InputHistory {
    entries: Vec<String>,
    /// Position while browsing; `None` when editing a fresh line.
    index: Option<usize>,
    /// The line being edited before browsing started.
    draft: String,
}

impl InputHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a submitted line. Blank lines and repeats of the last line are skipped.
    pub fn push(&mut self, line: &str) {
        self.index = None;
        self.draft.clear();

        let line = line.trim();
        if line.is_empty() || self.entries.last().map(String::as_str) == Some(line) {
            return;
        }
        if self.entries.len() == MAX_HISTORY {
            self.entries.remove(0);
        }
        self.entries.push(line.to_string());
    }

    /// Steps back in time. `current` is kept as the draft when browsing starts.
    pub fn previous(&mut self, current: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let index = match self.index {
            None => {
                self.draft = current.to_string();
                self.entries.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.index = Some(index);
        self.entries.get(index).map(String::as_str)
    }

    /// Steps forward; past the newest entry the draft comes back.
    pub fn next(&mut self) -> Option<&str> {
        let index = self.index?;
        if index + 1 < self.entries.len() {
            self.index = Some(index + 1);
            self.entries.get(index + 1).map(String::as_str)
        } else {
            self.index = None;
            Some(self.draft.as_str())
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What the event loop must do with the panel after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiRequest {
    Submit(String),
    Connect,
    ClearLog,
    Quit,
}

/// Terminal UI state.
#[derive(Debug)]
pub struct App {
    pub running: bool,
    pub input: InputState,
    pub history: InputHistory,
    /// Lines scrolled up from the newest log entry.
    pub log_scroll: u16,
    pending: usize,
    spinner: Option<Spinner>,
}

impl App {
    pub fn new() -> Self {
        Self {
            running: true,
            input: InputState::default(),
            history: InputHistory::new(),
            log_scroll: 0,
            pending: 0,
            spinner: None,
        }
    }

    /// Applies a key action. Editing is handled here; anything touching the device is
    /// returned to the caller.
    pub fn apply(&mut self, action: KeyAction) -> Option<UiRequest> {
        match action {
            KeyAction::Connect => return Some(UiRequest::Connect),
            KeyAction::ClearLog => {
                self.log_scroll = 0;
                return Some(UiRequest::ClearLog);
            }
            KeyAction::Quit => {
                self.running = false;
                return Some(UiRequest::Quit);
            }
            KeyAction::Submit => {
                if self.input.text().trim().is_empty() {
                    return None;
                }
                let line = self.input.take();
                self.history.push(&line);
                self.log_scroll = 0;
                return Some(UiRequest::Submit(line));
            }
            KeyAction::Insert(c) => self.input.insert(c),
            KeyAction::Backspace => self.input.backspace(),
            KeyAction::Delete => self.input.delete(),
            KeyAction::CursorLeft => self.input.move_left(),
            KeyAction::CursorRight => self.input.move_right(),
            KeyAction::CursorHome => self.input.move_home(),
            KeyAction::CursorEnd => self.input.move_end(),
            KeyAction::HistoryPrevious => {
                if let Some(line) = self.history.previous(self.input.text()) {
                    let line = line.to_string();
                    self.input.set(line);
                }
            }
            KeyAction::HistoryNext => {
                if let Some(line) = self.history.next() {
                    let line = line.to_string();
                    self.input.set(line);
                }
            }
            KeyAction::ScrollUp => self.log_scroll = self.log_scroll.saturating_add(SCROLL_STEP),
            KeyAction::ScrollDown => self.log_scroll = self.log_scroll.saturating_sub(SCROLL_STEP),
            KeyAction::ClearInput => self.input.clear(),
            KeyAction::Ignore => {}
        }
        None
    }

    /// A device call was started.
    pub fn request_started(&mut self) {
        self.pending += 1;
        if self.spinner.is_none() {
            self.spinner = Some(Spinner::new("Waiting for device"));
        }
    }

    /// A device call finished.
    pub fn request_finished(&mut self) {
        self.pending = self.pending.saturating_sub(1);
        if self.pending == 0 {
            self.spinner = None;
        }
    }

    /// Number of device calls in flight.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn spinner(&self) -> Option<&Spinner> {
        self.spinner.as_ref()
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
