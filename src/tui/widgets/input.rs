//! Command input widget for the TUI.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Width of the `> ` prompt.
pub const PROMPT_WIDTH: u16 = 2;

/// Number of characters to skip so the cursor stays visible.
pub fn calculate_scroll_offset(cursor: usize, available_width: usize) -> usize {
    cursor.saturating_sub(available_width)
}

/// Width left for text inside an input area of `area_width`.
///
/// Border left (1) + prompt (2) + border right (1) + cursor space (1).
pub fn available_width(area_width: u16) -> usize {
    area_width.saturating_sub(3 + PROMPT_WIDTH) as usize
}

/// Input bar widget.
pub struct InputBar<'a> {
    text: &'a str,
    /// Cursor position in characters.
    cursor: usize,
    connected: bool,
}

impl<'a> InputBar<'a> {
    pub fn new(text: &'a str, cursor: usize, connected: bool) -> Self {
        Self {
            text,
            cursor,
            connected,
        }
    }
}

impl Widget for InputBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.connected {
            " Command "
        } else {
            " Command (not connected: try 'connect <host>') "
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title);

        let prompt_style = Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD);

        let scroll_offset = calculate_scroll_offset(self.cursor, available_width(area.width));
        let visible_text: String = self.text.chars().skip(scroll_offset).collect();

        let line = Line::from(vec![
            Span::styled("> ", prompt_style),
            Span::raw(visible_text),
        ]);

        Paragraph::new(line).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_offset_cursor_within_width() {
        assert_eq!(calculate_scroll_offset(5, 20), 0);
        assert_eq!(calculate_scroll_offset(20, 20), 0);
    }

    #[test]
    fn test_scroll_offset_cursor_beyond_width() {
        assert_eq!(calculate_scroll_offset(25, 20), 5);
        assert_eq!(calculate_scroll_offset(5, 0), 5);
    }

    #[test]
    fn test_renders_prompt_and_text() {
        let area = Rect::new(0, 0, 30, 3);
        let mut buf = Buffer::empty(area);
        InputBar::new("led on", 6, true).render(area, &mut buf);

        let line: String = (0..area.width).map(|x| buf[(x, 1)].symbol()).collect();
        assert!(line.starts_with("│> led on"));
    }

    #[test]
    fn test_long_text_scrolls_by_chars() {
        let area = Rect::new(0, 0, 10, 3);
        let mut buf = Buffer::empty(area);
        InputBar::new("oled text héllo", 15, true).render(area, &mut buf);

        let line: String = (0..area.width).map(|x| buf[(x, 1)].symbol()).collect();
        assert!(line.contains("héllo"));
    }
}
