//! Activity log panel for the TUI.
//!
//! Shows the newest entries at the bottom, colored by severity. Long messages wrap onto
//! continuation lines.

use crate::activity::{ActivityLog, LogEntry, Severity};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Width of `[HH:MM:SS] ` before each message.
const TIMESTAMP_WIDTH: usize = 11;

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Info => Style::default().fg(Color::Gray),
        Severity::Success => Style::default().fg(Color::Green),
        Severity::Warning => Style::default().fg(Color::Yellow),
        Severity::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

/// Splits `text` into pieces of at most `width` characters.
fn wrap_chars(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

/// Lays out entries as display lines for an inner width of `width`.
fn entry_lines(entry: &LogEntry, width: usize) -> Vec<Line<'static>> {
    let style = severity_style(entry.severity);
    let message_width = width.saturating_sub(TIMESTAMP_WIDTH).max(1);
    let indent = " ".repeat(TIMESTAMP_WIDTH);

    wrap_chars(&entry.message, message_width)
        .into_iter()
        .enumerate()
        .map(|(i, piece)| {
            let prefix = if i == 0 {
                Span::styled(
                    format!("[{}] ", entry.timestamp),
                    Style::default().fg(Color::DarkGray),
                )
            } else {
                Span::raw(indent.clone())
            };
            Line::from(vec![prefix, Span::styled(piece, style)])
        })
        .collect()
}

/// Activity log panel widget.
pub struct LogPanel<'a> {
    log: &'a ActivityLog,
    /// Lines scrolled up from the bottom.
    scroll: u16,
}

impl<'a> LogPanel<'a> {
    pub fn new(log: &'a ActivityLog, scroll: u16) -> Self {
        Self { log, scroll }
    }
}

impl Widget for LogPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_width = area.width.saturating_sub(2) as usize;
        let inner_height = area.height.saturating_sub(2) as usize;

        let lines: Vec<Line> = self
            .log
            .entries()
            .flat_map(|entry| entry_lines(entry, inner_width))
            .collect();

        let max_top = lines.len().saturating_sub(inner_height);
        let top = max_top.saturating_sub(self.scroll as usize);
        let title = if top < max_top {
            " Activity (scrolled, PgDn for newest) "
        } else {
            " Activity "
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(title);

        Paragraph::new(lines)
            .block(block)
            .scroll((top as u16, 0))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rows(buf: &Buffer, area: Rect) -> Vec<String> {
        (0..area.height)
            .map(|y| (0..area.width).map(|x| buf[(x, y)].symbol()).collect())
            .collect()
    }

    #[test]
    fn test_wrap_chars() {
        assert_eq!(wrap_chars("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_chars("", 4), vec![""]);
        assert_eq!(wrap_chars("héllo", 2), vec!["hé", "ll", "o"]);
    }

    #[test]
    fn test_newest_entries_visible() {
        let mut log = ActivityLog::new();
        for i in 0..10 {
            log.info(format!("entry {i}"));
        }

        let area = Rect::new(0, 0, 40, 5);
        let mut buf = Buffer::empty(area);
        LogPanel::new(&log, 0).render(area, &mut buf);

        let rows = rows(&buf, area);
        assert!(rows[1].contains("entry 7"));
        assert!(rows[3].contains("entry 9"));
    }

    #[test]
    fn test_scrolled_view_shows_older_entries() {
        let mut log = ActivityLog::new();
        for i in 0..10 {
            log.info(format!("entry {i}"));
        }

        let area = Rect::new(0, 0, 60, 5);
        let mut buf = Buffer::empty(area);
        LogPanel::new(&log, 5).render(area, &mut buf);

        let rows = rows(&buf, area);
        assert!(rows[0].contains("scrolled"));
        assert!(rows[1].contains("entry 2"));
    }

    #[test]
    fn test_long_message_wraps() {
        let mut log = ActivityLog::new();
        log.success("x".repeat(30));

        let area = Rect::new(0, 0, 25, 6);
        let mut buf = Buffer::empty(area);
        LogPanel::new(&log, 0).render(area, &mut buf);

        let total: usize = rows(&buf, area)
            .iter()
            .map(|r| r.matches('x').count())
            .sum();
        assert_eq!(total, 30);
    }
}
