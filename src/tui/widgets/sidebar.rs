//! Sidebar widget for the TUI.
//!
//! Lists the available commands and keyboard shortcuts.

use crate::commands::help::HELP_TEXT;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Sidebar widget with the command reference.
pub struct Sidebar;

impl Widget for Sidebar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Commands ");

        let heading = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        let body = Style::default().fg(Color::Gray);

        let lines: Vec<Line> = HELP_TEXT
            .lines()
            .map(|line| {
                // Section titles are the unindented lines.
                let style = if line.starts_with(' ') { body } else { heading };
                Line::from(Span::styled(line, style))
            })
            .collect();

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
