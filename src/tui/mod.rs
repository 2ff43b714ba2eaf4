//! Terminal user interface for QueryBuddy.
//!
//! Provides the main TUI application loop using ratatui and crossterm. The
//! loop owns the handle cache and the agent; questions run in a spawned task
//! that streams progress events back over a channel.

pub mod app;
pub mod events;
mod ui;
pub mod widgets;

pub use app::App;
pub use events::Event;

use crate::agent::{Agent, AgentEvent};
use crate::config::LlmConfig;
use crate::db::HandleCache;
use crate::error::{AppError, Result};
use crate::llm::MockLlmClient;
use crate::tui::app::{AppAction, SetupForm, StartRequest};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// The main TUI application runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Database handles memoized across reconnects within this process.
    cache: HandleCache,
    /// The live agent once the chat phase has started.
    agent: Option<Arc<Agent>>,
    /// Model name used for real (non-mock) sessions.
    model: String,
    /// Replace the Groq client with a scripted mock (for offline use).
    mock_llm: bool,
    agent_tx: mpsc::UnboundedSender<AgentEvent>,
    agent_rx: mpsc::UnboundedReceiver<AgentEvent>,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new(llm: &LlmConfig, mock_llm: bool) -> Result<Self> {
        let terminal = Self::setup_terminal()?;
        let (agent_tx, agent_rx) = mpsc::unbounded_channel();

        Ok(Self {
            terminal,
            cache: HandleCache::new(),
            agent: None,
            model: llm.model.clone(),
            mock_llm,
            agent_tx,
            agent_rx,
        })
    }

    /// Sets up the terminal for TUI rendering.
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()
            .map_err(|e| AppError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .map_err(|e| AppError::internal(format!("Failed to enter alternate screen: {e}")))?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)
            .map_err(|e| AppError::internal(format!("Failed to create terminal: {e}")))?;

        Ok(terminal)
    }

    /// Restores the terminal to its original state.
    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()
            .map_err(|e| AppError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )
        .map_err(|e| AppError::internal(format!("Failed to leave alternate screen: {e}")))?;

        self.terminal
            .show_cursor()
            .map_err(|e| AppError::internal(format!("Failed to show cursor: {e}")))?;

        Ok(())
    }

    /// Runs the main TUI event loop.
    pub async fn run(&mut self, setup: SetupForm) -> Result<()> {
        // Restore the terminal even if something panics mid-draw.
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
            original_hook(panic_info);
        }));

        let mut app = App::new(setup);
        let result = self.run_event_loop(&mut app).await;

        let _ = panic::take_hook();
        result
    }

    /// The main event loop, separated for cleaner error handling.
    async fn run_event_loop(&mut self, app: &mut App) -> Result<()> {
        loop {
            self.terminal
                .draw(|frame| ui::render(frame, app))
                .map_err(|e| AppError::internal(format!("Failed to draw: {e}")))?;

            if !app.running {
                break;
            }

            tokio::select! {
                // Terminal events, polled off the async runtime.
                event_result = tokio::task::spawn_blocking(events::poll_next) => {
                    let event = event_result
                        .map_err(|e| AppError::internal(format!("Event task failed: {e}")))??;
                    if let Some(action) = app.handle_event(event) {
                        self.perform(app, action).await;
                    }
                }

                // Progress from the in-flight agent task.
                Some(agent_event) = self.agent_rx.recv() => {
                    Self::handle_agent_event(app, agent_event);
                }
            }
        }

        Ok(())
    }

    /// Performs an action requested by the app state.
    async fn perform(&mut self, app: &mut App, action: AppAction) {
        match action {
            AppAction::Start(request) => {
                // Show the connecting spinner before the await below blocks
                // the loop.
                let _ = self.terminal.draw(|frame| ui::render(frame, app));
                self.start_chat(app, request).await;
            }
            AppAction::Ask(question) => self.spawn_ask(app, question),
        }
    }

    /// Connects to the database and builds the agent.
    ///
    /// A single attempt; failures land back on the setup form with the
    /// connection error displayed.
    async fn start_chat(&mut self, app: &mut App, request: StartRequest) {
        if let Err(e) = app.session.start(&request.api_key) {
            app.start_failed(&e);
            return;
        }

        let handle = match self.cache.get_or_connect(&request.config).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Connection failed: {}", e);
                app.start_failed(&e);
                return;
            }
        };

        let agent = if self.mock_llm {
            Agent::new(handle, Arc::new(MockLlmClient::new()))
        } else {
            match Agent::with_groq(handle, &request.api_key, &self.model) {
                Ok(agent) => agent,
                Err(e) => {
                    warn!("Agent setup failed: {}", e);
                    app.start_failed(&e);
                    return;
                }
            }
        };

        info!("Connected: {}", request.config.display_string());
        self.agent = Some(Arc::new(agent));
        app.start_succeeded(request.config.display_string());
    }

    /// Spawns the agent on a question; the result arrives as a Finished event.
    fn spawn_ask(&self, app: &mut App, question: String) {
        let Some(agent) = self.agent.clone() else {
            return;
        };

        app.begin_question(&question);
        let tx = self.agent_tx.clone();
        tokio::spawn(async move {
            let outcome = agent.ask(&question, &tx).await.map_err(|e| e.to_string());
            let _ = tx.send(AgentEvent::Finished(outcome));
        });
    }

    /// Applies an agent progress event to the app state.
    fn handle_agent_event(app: &mut App, event: AgentEvent) {
        match event {
            AgentEvent::ToolCall { summary, .. } => app.push_activity(summary),
            AgentEvent::ToolResult { name, summary } => {
                app.push_activity(format!("{name}: {summary}"));
            }
            AgentEvent::Finished(outcome) => app.finish_turn(outcome),
        }
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

/// Runs the TUI application.
pub async fn run(setup: SetupForm, llm: &LlmConfig, mock_llm: bool) -> Result<()> {
    let mut tui = Tui::new(llm, mock_llm)?;
    tui.run(setup).await
}
