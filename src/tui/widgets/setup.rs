//! Setup form widget for the TUI.
//!
//! The pre-chat screen: database mode selection, credential fields, and the
//! masked API key input.

use crate::tui::app::{SetupField, SetupForm};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Setup form widget.
pub struct SetupPanel<'a> {
    form: &'a SetupForm,
}

impl<'a> SetupPanel<'a> {
    /// Creates a new setup panel widget.
    pub fn new(form: &'a SetupForm) -> Self {
        Self { form }
    }

    fn field_line(&self, field: SetupField, label: &'a str, value: String) -> Line<'a> {
        let focused = self.form.focus == field;
        let label_style = if focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let value_style = if focused {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default().fg(Color::White)
        };
        let marker = if focused { "❯ " } else { "  " };

        Line::from(vec![
            Span::styled(marker, label_style),
            Span::styled(format!("{label:<18}"), label_style),
            Span::styled(value, value_style),
        ])
    }
}

/// Masks a secret for display, keeping its length visible.
fn mask(text: &str) -> String {
    "•".repeat(text.chars().count())
}

impl Widget for SetupPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Setup ");

        let form = self.form;
        let mut lines = vec![
            Line::from(Span::styled(
                "Connect to a database and start chatting.",
                Style::default().fg(Color::Gray),
            )),
            Line::from(""),
            self.field_line(
                SetupField::Mode,
                "Database",
                format!("◂ {} ▸", form.mode.label()),
            ),
            Line::from(""),
        ];

        for &field in form.credential_fields() {
            let line = match field {
                SetupField::SqlitePath => {
                    self.field_line(field, "File path", form.sqlite_path.text.clone())
                }
                SetupField::MySqlHost => {
                    self.field_line(field, "Host", form.mysql_host.text.clone())
                }
                SetupField::MySqlUser => {
                    self.field_line(field, "User", form.mysql_user.text.clone())
                }
                SetupField::MySqlPassword => {
                    self.field_line(field, "Password", mask(&form.mysql_password.text))
                }
                SetupField::MySqlDatabase => {
                    self.field_line(field, "Database name", form.mysql_database.text.clone())
                }
                SetupField::PostgresUri => {
                    self.field_line(field, "Connection URI", form.postgres_uri.text.clone())
                }
                _ => continue,
            };
            lines.push(line);
        }

        lines.push(Line::from(""));
        lines.push(self.field_line(
            SetupField::ApiKey,
            "Groq API key",
            mask(&form.api_key.text),
        ));
        lines.push(Line::from(""));

        let start_focused = form.focus == SetupField::Start;
        let start_style = if start_focused {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Green)
        };
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(" Start chat ", start_style),
        ]));

        if let Some(error) = &form.error {
            lines.push(Line::from(""));
            for error_line in error.lines() {
                lines.push(Line::from(Span::styled(
                    error_line.to_string(),
                    Style::default().fg(Color::Red),
                )));
            }
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "↑/↓ move  ◂/▸ change database  Enter start  Ctrl+C quit",
            Style::default().fg(Color::DarkGray),
        )));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_keeps_length() {
        assert_eq!(mask("secret"), "••••••");
        assert_eq!(mask(""), "");
    }
}
