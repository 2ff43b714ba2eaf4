//! Input widget for the TUI.
//!
//! Provides the chat input bar with cursor support.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Returns the display column of a byte position in `text`.
///
/// The editing state tracks the cursor in bytes; rendering and scrolling
/// work in columns, one per character.
pub fn column_at(text: &str, byte_pos: usize) -> usize {
    text.char_indices().take_while(|(i, _)| *i < byte_pos).count()
}

/// Calculates the scroll offset needed to keep the cursor visible.
///
/// Both the cursor position and the returned offset are in display
/// columns, not bytes.
pub fn calculate_scroll_offset(cursor_col: usize, available_width: usize) -> usize {
    if cursor_col <= available_width {
        0
    } else {
        cursor_col.saturating_sub(available_width)
    }
}

/// Input bar widget.
pub struct InputBar<'a> {
    text: &'a str,
    cursor: usize,
    focused: bool,
}

impl<'a> InputBar<'a> {
    /// Creates a new input bar widget.
    ///
    /// `cursor` is a byte position into `text`, on a char boundary.
    pub fn new(text: &'a str, cursor: usize, focused: bool) -> Self {
        Self {
            text,
            cursor,
            focused,
        }
    }
}

impl Widget for InputBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Ask anything about your database ");

        let prompt_style = Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD);

        // Border left (1) + prompt "> " (2) + border right (1) + cursor space (1) = 5
        let available_width = area.width.saturating_sub(5) as usize;
        let cursor_col = column_at(self.text, self.cursor);
        let scroll_cols = calculate_scroll_offset(cursor_col, available_width);

        // Skip whole characters, never landing mid-char.
        let visible_text = self
            .text
            .char_indices()
            .nth(scroll_cols)
            .map(|(start, _)| &self.text[start..])
            .unwrap_or("");

        let line = Line::from(vec![
            Span::styled("> ", prompt_style),
            Span::raw(visible_text),
        ]);

        Paragraph::new(line).block(block).render(area, buf);
    }
}
