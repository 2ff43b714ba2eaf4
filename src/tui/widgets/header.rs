//! Header widget for the TUI.
//!
//! Displays the application name, version, spinner, and connection info.

use super::spinner::Spinner;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
};

/// Header bar widget.
pub struct Header<'a> {
    connection_info: Option<&'a str>,
    spinner: Option<&'a Spinner>,
}

impl<'a> Header<'a> {
    /// Creates a new header widget.
    pub fn new(connection_info: Option<&'a str>, spinner: Option<&'a Spinner>) -> Self {
        Self {
            connection_info,
            spinner,
        }
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

        // Left side: app name and version
        let left_text = format!(" QueryBuddy v{}", env!("CARGO_PKG_VERSION"));
        let left_span = Span::styled(left_text, style);
        buf.set_span(area.x, area.y, &left_span, area.width);

        // Center: spinner if active
        if let Some(spinner) = self.spinner {
            let spinner_text = spinner.display();
            let spinner_style = Style::default()
                .bg(Color::Blue)
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD);
            let spinner_width = spinner_text.chars().count() as u16;
            let spinner_x = area.x + (area.width.saturating_sub(spinner_width)) / 2;
            buf.set_string(spinner_x, area.y, &spinner_text, spinner_style);
        }

        // Right side: connection status dot and info
        if let Some(info) = self.connection_info {
            let status_style = Style::default().bg(Color::Blue).fg(Color::Green);
            let db_text = format!(" [{info}] ");
            let right_width = db_text.chars().count() as u16 + 2;
            if right_width < area.width {
                let right_x = area.right().saturating_sub(right_width);
                buf.set_string(right_x, area.y, " ", style);
                buf.set_string(right_x + 1, area.y, "●", status_style);
                buf.set_string(right_x + 2, area.y, &db_text, style);
            }
        }
    }
}
