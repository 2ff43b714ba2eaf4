//! Chat panel widget for the TUI.
//!
//! Displays the transcript, agent activity lines, and inline notices.

use crate::session::{Speaker, Transcript};
use crate::tui::app::{Notice, NoticeKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// Chat panel widget.
pub struct ChatPanel<'a> {
    transcript: &'a Transcript,
    activity: &'a [String],
    notice: Option<&'a Notice>,
    /// Scroll offset in lines from the bottom.
    scroll: usize,
    focused: bool,
}

impl<'a> ChatPanel<'a> {
    /// Creates a new chat panel widget.
    pub fn new(
        transcript: &'a Transcript,
        activity: &'a [String],
        notice: Option<&'a Notice>,
        scroll: usize,
        focused: bool,
    ) -> Self {
        Self {
            transcript,
            activity,
            notice,
            scroll,
            focused,
        }
    }

    fn build_lines(&self) -> Vec<Line<'a>> {
        let mut lines = Vec::new();

        let user_style = Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD);
        let assistant_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);

        for entry in self.transcript.entries() {
            let (label, style) = match entry.speaker {
                Speaker::User => ("You", user_style),
                Speaker::Assistant => ("QueryBuddy", assistant_style),
            };
            lines.push(Line::from(Span::styled(label, style)));
            for content_line in entry.content.lines() {
                lines.push(Line::from(content_line));
            }
            lines.push(Line::from(""));
        }

        // Agent activity from the current turn, rendered dimmed.
        let activity_style = Style::default().fg(Color::DarkGray);
        for item in self.activity {
            lines.push(Line::from(Span::styled(
                format!("  · {item}"),
                activity_style,
            )));
        }

        if let Some(notice) = self.notice {
            let notice_style = match notice.kind {
                NoticeKind::Error => Style::default().fg(Color::Red),
                NoticeKind::Info => Style::default().fg(Color::Yellow),
            };
            if !self.activity.is_empty() {
                lines.push(Line::from(""));
            }
            for text_line in notice.text.lines() {
                lines.push(Line::from(Span::styled(text_line, notice_style)));
            }
        }

        lines
    }
}

impl Widget for ChatPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Chat ");

        let lines = self.build_lines();
        let total = lines.len();
        let visible = area.height.saturating_sub(2) as usize;

        // Anchor to the bottom, then apply the user's scroll-back offset.
        let scroll_from_top = total
            .saturating_sub(visible)
            .saturating_sub(self.scroll.min(total));

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((scroll_from_top as u16, 0))
            .render(area, buf);
    }
}
