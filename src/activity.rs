//! Activity log shown in the panel.
//!
//! A bounded, insertion-ordered list of timestamped entries. Once the log is full the
//! oldest entry is evicted for every new one.

use chrono::Local;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::Level;

/// Maximum number of entries kept in the log.
pub const MAX_LOG_ENTRIES: usize = 100;

/// Message written by [`ActivityLog::clear`].
pub const LOG_CLEARED_MESSAGE: &str = "Log cleared";

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// Short uppercase label for text output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Success => "OK",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// Level used when the entry is mirrored to the tracing log.
    pub fn tracing_level(&self) -> Level {
        match self {
            Self::Info | Self::Success => Level::INFO,
            Self::Warning => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }
}

/// A single log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Local time of the entry, formatted for display (`HH:MM:SS`).
    pub timestamp: String,
    pub message: String,
    pub severity: Severity,
}

impl LogEntry {
    fn now(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            message: message.into(),
            severity,
        }
    }

    /// Renders the entry as `[HH:MM:SS] LEVEL message`.
    pub fn display_line(&self) -> String {
        format!(
            "[{}] {:<5} {}",
            self.timestamp,
            self.severity.label(),
            self.message
        )
    }
}

/// Fixed-capacity activity log.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLog {
    /// Creates an empty log holding at most [`MAX_LOG_ENTRIES`] entries.
    pub fn new() -> Self {
        Self::with_capacity(MAX_LOG_ENTRIES)
    }

    /// Creates an empty log with a custom capacity (at least one entry).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an entry stamped with the current local time.
    pub fn append(&mut self, message: impl Into<String>, severity: Severity) {
        let entry = LogEntry::now(message, severity);

        let level = severity.tracing_level();
        if level == Level::ERROR {
            tracing::error!(target: "devpanel::activity", "{}", entry.message);
        } else if level == Level::WARN {
            tracing::warn!(target: "devpanel::activity", "{}", entry.message);
        } else {
            tracing::info!(target: "devpanel::activity", "{}", entry.message);
        }

        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.append(message, Severity::Info);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.append(message, Severity::Success);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.append(message, Severity::Warning);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.append(message, Severity::Error);
    }

    /// Drops every entry and leaves a single "log cleared" entry behind.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.append(LOG_CLEARED_MESSAGE, Severity::Info);
    }

    /// Iterates entries from oldest to newest.
    pub fn entries(&self) -> std::collections::vec_deque::Iter<'_, LogEntry> {
        self.entries.iter()
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
