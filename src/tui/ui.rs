//! UI rendering for the TUI.
//!
//! Defines the layout and renders all UI components.

use super::app::App;
use super::widgets::{header, input, log, sidebar};
use crate::app::Panel;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App, panel: &Panel) {
    let area = frame.area();

    // Main layout: header, content, input
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(area);

    // Content layout: activity log (70%) and command reference (30%)
    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(main_layout[1]);

    render_header(frame, main_layout[0], app, panel);
    frame.render_widget(log::LogPanel::new(panel.log(), app.log_scroll), content_layout[0]);
    frame.render_widget(sidebar::Sidebar, content_layout[1]);
    render_input(frame, main_layout[2], app, panel);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App, panel: &Panel) {
    let connection = panel.connection();
    let endpoint = connection.endpoint();
    let url = endpoint.is_specified().then(|| endpoint.to_string());

    let widget = header::Header::new(url.as_deref(), connection.status())
        .spinner(app.spinner(), app.pending());
    frame.render_widget(widget, area);
}

fn render_input(frame: &mut Frame, area: Rect, app: &App, panel: &Panel) {
    let cursor = app.input.cursor();
    let widget = input::InputBar::new(app.input.text(), cursor, panel.connection().is_connected());
    frame.render_widget(widget, area);

    let visible_cursor =
        cursor - input::calculate_scroll_offset(cursor, input::available_width(area.width));
    // Border (1) + prompt
    let cursor_x = area.x + 1 + input::PROMPT_WIDTH + visible_cursor as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
}
