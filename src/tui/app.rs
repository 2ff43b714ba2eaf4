//! Application state for the TUI.
//!
//! The app moves through two phases: the setup form where the user picks a
//! database and enters credentials, and the chat view once a connection has
//! been established. All state transitions here are synchronous; the event
//! loop in `tui::mod` drives the async work and feeds results back in.

use crate::config::{ConnectionConfig, ConnectionMode};
use crate::error::AppError;
use crate::session::Session;
use crate::tui::widgets::Spinner;
use std::path::PathBuf;

/// Which screen the app is currently on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Setup,
    Chat,
}

/// Which panel has focus in the chat phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Chat,
}

impl Focus {
    /// Toggles between the input bar and the chat panel.
    pub fn next(self) -> Self {
        match self {
            Self::Input => Self::Chat,
            Self::Chat => Self::Input,
        }
    }
}

/// Severity of an inline notice in the chat panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Info,
}

/// A transient message shown inline below the transcript.
///
/// Errors from a failed turn land here rather than in the transcript, so the
/// chat history only ever contains real questions and answers.
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }
}

/// Input state for text editing.
#[derive(Debug, Default)]
pub struct InputState {
    /// Current input text.
    pub text: String,
    /// Cursor position (byte index, always on a char boundary).
    pub cursor: usize,
}

impl InputState {
    /// Creates a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an input state pre-filled with text, cursor at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        Self { text, cursor }
    }

    /// Inserts a character at the cursor position.
    pub fn insert(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Deletes the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let prev = self.text[..self.cursor]
                .chars()
                .next_back()
                .map(char::len_utf8)
                .unwrap_or(0);
            self.cursor -= prev;
            self.text.remove(self.cursor);
        }
    }

    /// Deletes the character at the cursor (delete key).
    pub fn delete(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
        }
    }

    /// Moves the cursor left.
    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            let prev = self.text[..self.cursor]
                .chars()
                .next_back()
                .map(char::len_utf8)
                .unwrap_or(0);
            self.cursor -= prev;
        }
    }

    /// Moves the cursor right.
    pub fn move_right(&mut self) {
        if self.cursor < self.text.len() {
            let next = self.text[self.cursor..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(0);
            self.cursor += next;
        }
    }

    /// Moves the cursor to the start of the input.
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Moves the cursor to the end of the input.
    pub fn move_end(&mut self) {
        self.cursor = self.text.len();
    }

    /// Clears the input and returns the previous text.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// Returns true if the input is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A field on the setup form, in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupField {
    Mode,
    SqlitePath,
    MySqlHost,
    MySqlUser,
    MySqlPassword,
    MySqlDatabase,
    PostgresUri,
    ApiKey,
    Start,
}

/// State of the pre-chat setup form.
#[derive(Debug, Default)]
pub struct SetupForm {
    pub mode: ConnectionMode,
    pub sqlite_path: InputState,
    pub mysql_host: InputState,
    pub mysql_user: InputState,
    pub mysql_password: InputState,
    pub mysql_database: InputState,
    pub postgres_uri: InputState,
    pub api_key: InputState,
    pub focus: SetupField,
    /// Validation or connection error shown below the form.
    pub error: Option<String>,
}

impl Default for SetupField {
    fn default() -> Self {
        Self::Mode
    }
}

impl SetupForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fills the form from CLI arguments.
    pub fn with_prefill(config: Option<&ConnectionConfig>, api_key: Option<&str>) -> Self {
        let mut form = Self::new();
        if let Some(config) = config {
            form.mode = config.mode();
            match config {
                ConnectionConfig::LocalFile { path } => {
                    if let Some(path) = path {
                        form.sqlite_path = InputState::with_text(path.display().to_string());
                    }
                }
                ConnectionConfig::MySql {
                    host,
                    user,
                    password,
                    database,
                } => {
                    form.mysql_host = InputState::with_text(host.clone());
                    form.mysql_user = InputState::with_text(user.clone());
                    form.mysql_password = InputState::with_text(password.clone());
                    form.mysql_database = InputState::with_text(database.clone());
                }
                ConnectionConfig::HostedPostgres { uri } => {
                    form.postgres_uri = InputState::with_text(uri.clone());
                }
            }
        }
        if let Some(key) = api_key {
            form.api_key = InputState::with_text(key);
        }
        form
    }

    /// The credential fields shown for the current mode.
    pub fn credential_fields(&self) -> &'static [SetupField] {
        match self.mode {
            ConnectionMode::LocalFile => &[SetupField::SqlitePath],
            ConnectionMode::MySql => &[
                SetupField::MySqlHost,
                SetupField::MySqlUser,
                SetupField::MySqlPassword,
                SetupField::MySqlDatabase,
            ],
            ConnectionMode::HostedPostgres => &[SetupField::PostgresUri],
        }
    }

    /// Full navigation order for the current mode.
    fn field_order(&self) -> Vec<SetupField> {
        let mut order = vec![SetupField::Mode];
        order.extend_from_slice(self.credential_fields());
        order.push(SetupField::ApiKey);
        order.push(SetupField::Start);
        order
    }

    /// Moves focus to the next field.
    pub fn focus_next(&mut self) {
        let order = self.field_order();
        let index = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(index + 1) % order.len()];
    }

    /// Moves focus to the previous field.
    pub fn focus_prev(&mut self) {
        let order = self.field_order();
        let index = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(index + order.len() - 1) % order.len()];
    }

    /// Cycles the database mode. Focus is kept on the mode selector.
    pub fn cycle_mode(&mut self, forward: bool) {
        self.mode = if forward {
            self.mode.next()
        } else {
            self.mode.prev()
        };
        self.error = None;
    }

    /// The text input backing the focused field, if any.
    pub fn focused_input(&mut self) -> Option<&mut InputState> {
        match self.focus {
            SetupField::SqlitePath => Some(&mut self.sqlite_path),
            SetupField::MySqlHost => Some(&mut self.mysql_host),
            SetupField::MySqlUser => Some(&mut self.mysql_user),
            SetupField::MySqlPassword => Some(&mut self.mysql_password),
            SetupField::MySqlDatabase => Some(&mut self.mysql_database),
            SetupField::PostgresUri => Some(&mut self.postgres_uri),
            SetupField::ApiKey => Some(&mut self.api_key),
            SetupField::Mode | SetupField::Start => None,
        }
    }

    /// Builds the connection config from the form fields for the current mode.
    pub fn to_connection_config(&self) -> ConnectionConfig {
        match self.mode {
            ConnectionMode::LocalFile => {
                let text = self.sqlite_path.text.trim();
                ConnectionConfig::LocalFile {
                    path: if text.is_empty() {
                        None
                    } else {
                        Some(PathBuf::from(text))
                    },
                }
            }
            ConnectionMode::MySql => ConnectionConfig::MySql {
                host: self.mysql_host.text.trim().to_string(),
                user: self.mysql_user.text.trim().to_string(),
                password: self.mysql_password.text.clone(),
                database: self.mysql_database.text.trim().to_string(),
            },
            ConnectionMode::HostedPostgres => ConnectionConfig::HostedPostgres {
                uri: self.postgres_uri.text.trim().to_string(),
            },
        }
    }
}

/// A validated request to connect and start chatting.
#[derive(Debug, Clone)]
pub struct StartRequest {
    pub config: ConnectionConfig,
    pub api_key: String,
}

/// An action the event loop has to perform on the app's behalf.
#[derive(Debug, Clone)]
pub enum AppAction {
    /// Connect to the database and start the chat phase.
    Start(StartRequest),
    /// Run the agent on a question.
    Ask(String),
}

const HELP_TEXT: &str = "Commands:\n  /clear  reset the conversation\n  /help   show this help\n  /quit   exit\nTab switches focus, Up/Down scroll the chat.";

/// Main application state.
pub struct App {
    /// Whether the application is still running.
    pub running: bool,
    /// Current phase.
    pub phase: Phase,
    /// Setup form state.
    pub setup: SetupForm,
    /// Focused panel in the chat phase.
    pub focus: Focus,
    /// Chat input field state.
    pub input: InputState,
    /// Chat session: readiness and transcript.
    pub session: Session,
    /// Tool activity lines for the current turn.
    pub activity: Vec<String>,
    /// Inline notice below the transcript.
    pub notice: Option<Notice>,
    /// Chat scroll offset (lines from bottom).
    pub chat_scroll: usize,
    /// Whether a question or connection attempt is in flight.
    pub is_processing: bool,
    /// Spinner shown while processing.
    pub spinner: Option<Spinner>,
    /// Database connection info for the header.
    pub connection_info: Option<String>,
}

impl App {
    /// Creates a new App in the setup phase.
    pub fn new(setup: SetupForm) -> Self {
        Self {
            running: true,
            phase: Phase::Setup,
            setup,
            focus: Focus::default(),
            input: InputState::new(),
            session: Session::new(),
            activity: Vec::new(),
            notice: None,
            chat_scroll: 0,
            is_processing: false,
            spinner: None,
            connection_info: None,
        }
    }

    /// Handles an event and returns any async action the event loop must run.
    pub fn handle_event(&mut self, event: super::Event) -> Option<AppAction> {
        use super::Event;

        match event {
            Event::Key(key) => match self.phase {
                Phase::Setup => self.handle_setup_key(key),
                Phase::Chat => self.handle_chat_key(key),
            },
            Event::Resize(_, _) => None,
            // Ticks only trigger a redraw for the spinner animation.
            Event::Tick => None,
        }
    }

    fn handle_setup_key(&mut self, key: crossterm::event::KeyEvent) -> Option<AppAction> {
        use crossterm::event::{KeyCode, KeyModifiers};

        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
        {
            self.running = false;
            return None;
        }

        // Keys are ignored while a connection attempt is in flight.
        if self.is_processing {
            return None;
        }

        match key.code {
            KeyCode::Up | KeyCode::BackTab => self.setup.focus_prev(),
            KeyCode::Down | KeyCode::Tab => self.setup.focus_next(),
            KeyCode::Left if self.setup.focus == SetupField::Mode => self.setup.cycle_mode(false),
            KeyCode::Right if self.setup.focus == SetupField::Mode => self.setup.cycle_mode(true),
            KeyCode::Enter => {
                if self.setup.focus == SetupField::Start {
                    return self.submit_setup().map(AppAction::Start);
                }
                self.setup.focus_next();
            }
            KeyCode::Char(c) => {
                if let Some(input) = self.setup.focused_input() {
                    input.insert(c);
                    self.setup.error = None;
                }
            }
            KeyCode::Backspace => {
                if let Some(input) = self.setup.focused_input() {
                    input.backspace();
                }
            }
            KeyCode::Delete => {
                if let Some(input) = self.setup.focused_input() {
                    input.delete();
                }
            }
            KeyCode::Left => {
                if let Some(input) = self.setup.focused_input() {
                    input.move_left();
                }
            }
            KeyCode::Right => {
                if let Some(input) = self.setup.focused_input() {
                    input.move_right();
                }
            }
            KeyCode::Home => {
                if let Some(input) = self.setup.focused_input() {
                    input.move_home();
                }
            }
            KeyCode::End => {
                if let Some(input) = self.setup.focused_input() {
                    input.move_end();
                }
            }
            _ => {}
        }
        None
    }

    fn handle_chat_key(&mut self, key: crossterm::event::KeyEvent) -> Option<AppAction> {
        use crossterm::event::{KeyCode, KeyModifiers};

        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
        {
            self.running = false;
            return None;
        }

        match key.code {
            KeyCode::Tab => {
                self.focus = self.focus.next();
                None
            }

            KeyCode::Up if self.focus == Focus::Chat => {
                self.chat_scroll = self.chat_scroll.saturating_add(1);
                None
            }
            KeyCode::Down if self.focus == Focus::Chat => {
                self.chat_scroll = self.chat_scroll.saturating_sub(1);
                None
            }
            KeyCode::PageUp if self.focus == Focus::Chat => {
                self.chat_scroll = self.chat_scroll.saturating_add(10);
                None
            }
            KeyCode::PageDown if self.focus == Focus::Chat => {
                self.chat_scroll = self.chat_scroll.saturating_sub(10);
                None
            }
            KeyCode::Home if self.focus == Focus::Chat => {
                self.chat_scroll = usize::MAX; // Clamped during render
                None
            }
            KeyCode::End if self.focus == Focus::Chat => {
                self.chat_scroll = 0;
                None
            }

            _ if self.focus == Focus::Input => self.handle_input_key(key),
            _ => None,
        }
    }

    /// Handles key events when the chat input is focused.
    fn handle_input_key(&mut self, key: crossterm::event::KeyEvent) -> Option<AppAction> {
        use crossterm::event::KeyCode;

        match key.code {
            KeyCode::Char(c) => self.input.insert(c),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.move_left(),
            KeyCode::Right => self.input.move_right(),
            KeyCode::Home => self.input.move_home(),
            KeyCode::End => self.input.move_end(),
            KeyCode::Enter if !self.is_processing => {
                return self.submit_chat_input().map(AppAction::Ask);
            }
            _ => {}
        }
        None
    }

    /// Validates the setup form and returns a start request if it passes.
    ///
    /// Validation failures land in `setup.error`; nothing is connected yet.
    pub fn submit_setup(&mut self) -> Option<StartRequest> {
        let config = self.setup.to_connection_config();
        if let Err(e) = config.validate() {
            self.setup.error = Some(e.to_string());
            return None;
        }
        let api_key = self.setup.api_key.text.trim().to_string();
        if api_key.is_empty() {
            self.setup.error = Some("Please add your Groq API key.".to_string());
            return None;
        }
        self.setup.error = None;
        self.is_processing = true;
        self.spinner = Some(Spinner::connecting());
        Some(StartRequest { config, api_key })
    }

    /// Called when the connection attempt succeeded.
    pub fn start_succeeded(&mut self, connection_info: String) {
        self.is_processing = false;
        self.spinner = None;
        self.connection_info = Some(connection_info);
        self.phase = Phase::Chat;
        self.focus = Focus::Input;
    }

    /// Called when the connection attempt failed. Stays on the setup form.
    pub fn start_failed(&mut self, error: &AppError) {
        self.is_processing = false;
        self.spinner = None;
        self.setup.error = Some(error.to_string());
    }

    /// Takes the chat input and interprets slash commands.
    ///
    /// Returns the question to ask the agent, or None if the input was empty
    /// or a command that was handled locally.
    pub fn submit_chat_input(&mut self) -> Option<String> {
        let text = self.input.take();
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        match text {
            "/quit" | "/exit" => {
                self.running = false;
                None
            }
            "/clear" => {
                self.session.clear();
                self.activity.clear();
                self.notice = None;
                self.chat_scroll = 0;
                None
            }
            "/help" => {
                self.notice = Some(Notice::info(HELP_TEXT));
                None
            }
            _ => Some(text.to_string()),
        }
    }

    /// Records the question and puts the app into the processing state.
    pub fn begin_question(&mut self, question: &str) {
        self.session.begin_turn(question);
        self.activity.clear();
        self.notice = None;
        self.chat_scroll = 0;
        self.is_processing = true;
        self.spinner = Some(Spinner::thinking());
    }

    /// Appends a tool activity line for the current turn.
    pub fn push_activity(&mut self, line: String) {
        self.activity.push(line);
        self.chat_scroll = 0;
    }

    /// Completes the current turn with the agent's outcome.
    ///
    /// A failed turn leaves the question in the transcript and shows the
    /// error as an inline notice.
    pub fn finish_turn(&mut self, outcome: std::result::Result<String, String>) {
        let outcome = outcome.map_err(AppError::query);
        self.session.complete_turn(&outcome);
        if let Err(e) = &outcome {
            self.notice = Some(Notice::error(e.to_string()));
        }
        self.is_processing = false;
        self.spinner = None;
        self.chat_scroll = 0;
    }
}
