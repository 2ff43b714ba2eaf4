//! UI rendering for the TUI.
//!
//! Defines the layout for both phases and renders all components.

use super::app::{App, Focus, Phase};
use super::widgets::{calculate_scroll_offset, column_at, ChatPanel, Header, InputBar, SetupPanel};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    match app.phase {
        Phase::Setup => render_setup(frame, app),
        Phase::Chat => render_chat_view(frame, app),
    }
}

/// Renders the setup phase: header bar plus the credential form.
fn render_setup(frame: &mut Frame, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(frame.area());

    frame.render_widget(Header::new(None, app.spinner.as_ref()), layout[0]);
    frame.render_widget(SetupPanel::new(&app.setup), layout[1]);
}

/// Renders the chat phase: header, transcript, and the input bar.
fn render_chat_view(frame: &mut Frame, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Chat panel
            Constraint::Length(3), // Input
        ])
        .split(frame.area());

    let header = Header::new(app.connection_info.as_deref(), app.spinner.as_ref());
    frame.render_widget(header, layout[0]);

    let chat = ChatPanel::new(
        app.session.transcript(),
        &app.activity,
        app.notice.as_ref(),
        app.chat_scroll,
        app.focus == Focus::Chat,
    );
    frame.render_widget(chat, layout[1]);

    render_input(frame, layout[2], app);
}

/// Renders the input bar and positions the terminal cursor.
fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Input;
    let widget = InputBar::new(&app.input.text, app.input.cursor, focused);
    frame.render_widget(widget, area);

    if focused && !app.is_processing {
        // Account for border (1), prompt "> " (2), and horizontal scroll.
        let available_width = area.width.saturating_sub(5) as usize;
        let cursor_col = column_at(&app.input.text, app.input.cursor);
        let scroll_offset = calculate_scroll_offset(cursor_col, available_width);
        let cursor_x = area.x + 3 + (cursor_col - scroll_offset) as u16;
        let cursor_y = area.y + 1;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}
