//! Header widget for the TUI.
//!
//! Displays the application name, the device address and its connection status.

use super::spinner::Spinner;
use crate::connection::DeviceStatus;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
};

/// Header bar widget.
pub struct Header<'a> {
    /// Base URL, or `None` before a host is entered.
    endpoint: Option<&'a str>,
    status: DeviceStatus,
    spinner: Option<(&'a Spinner, usize)>,
}

impl<'a> Header<'a> {
    pub fn new(endpoint: Option<&'a str>, status: DeviceStatus) -> Self {
        Self {
            endpoint,
            status,
            spinner: None,
        }
    }

    /// Shows a spinner for `pending` calls in flight.
    pub fn spinner(mut self, spinner: Option<&'a Spinner>, pending: usize) -> Self {
        self.spinner = spinner.map(|s| (s, pending));
        self
    }

    fn status_text(&self) -> String {
        let state = if self.status.online { "online" } else { "offline" };
        let last = self
            .status
            .last_response_ms
            .map(|ms| format!(" | {ms}ms"))
            .unwrap_or_default();
        format!(" {} | {state}{last} ", self.endpoint.unwrap_or("no device"))
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }

        let left_text = format!(" devpanel v{}", env!("CARGO_PKG_VERSION"));
        buf.set_span(area.x, area.y, &Span::styled(left_text, style), area.width);

        if let Some((spinner, pending)) = self.spinner {
            let spinner_text = spinner.display(pending);
            let spinner_style = style.fg(Color::Yellow);
            let spinner_width = spinner_text.chars().count() as u16;
            let spinner_x = area.x + (area.width.saturating_sub(spinner_width)) / 2;
            buf.set_string(spinner_x, area.y, &spinner_text, spinner_style);
        }

        let status_dot = if self.status.online { "●" } else { "○" };
        let dot_color = if self.status.online {
            Color::Green
        } else {
            Color::Gray
        };

        let right_text = self.status_text();
        let right_width = right_text.chars().count() as u16 + 2;
        if right_width < area.width {
            let right_x = area.right().saturating_sub(right_width);
            buf.set_string(right_x, area.y, " ", style);
            buf.set_string(right_x + 1, area.y, status_dot, style.fg(dot_color));
            buf.set_string(right_x + 2, area.y, &right_text, style);
        }
    }
}
