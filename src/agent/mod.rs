//! The SQL agent: binds an LLM client and a database handle for one session.
//!
//! Each question runs an independent tool loop: the model sees the system
//! prompt and the question, requests toolkit calls, gets their results fed
//! back, and eventually produces a plain-text answer. Tool activity is
//! streamed to the UI over a channel as it happens.

mod prompt;
mod toolkit;

pub use toolkit::SqlToolkit;

use crate::db::DatabaseHandle;
use crate::error::{AppError, Result};
use crate::llm::{GroqClient, GroqConfig, LlmClient, Message};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Upper bound on tool rounds per question, so a confused model cannot loop
/// forever.
const MAX_TOOL_ROUNDS: usize = 8;

/// Progress events streamed to the UI while a question is being answered.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// The model requested a tool call.
    ToolCall { name: String, summary: String },
    /// A tool call finished.
    ToolResult { name: String, summary: String },
    /// The turn is over: the final answer, or the error to show inline.
    Finished(std::result::Result<String, String>),
}

/// The agent bound to one database handle and one LLM client.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    toolkit: SqlToolkit,
    dialect: &'static str,
}

impl Agent {
    /// Creates an agent from an existing LLM client.
    pub fn new(handle: Arc<dyn DatabaseHandle>, llm: Arc<dyn LlmClient>) -> Self {
        let dialect = handle.dialect();
        Self {
            llm,
            toolkit: SqlToolkit::new(handle),
            dialect,
        }
    }

    /// Creates an agent backed by the Groq API.
    pub fn with_groq(
        handle: Arc<dyn DatabaseHandle>,
        api_key: &str,
        model: &str,
    ) -> Result<Self> {
        let client = GroqClient::new(GroqConfig::new(api_key, model))?;
        Ok(Self::new(handle, Arc::new(client)))
    }

    /// Answers a single question, streaming tool activity to `events`.
    ///
    /// The question is sent alone with the system prompt; previous turns are
    /// not included. Returns the final answer text, or a query error if the
    /// LLM or a tool round fails.
    pub async fn ask(
        &self,
        question: &str,
        events: &mpsc::UnboundedSender<AgentEvent>,
    ) -> Result<String> {
        let tools = SqlToolkit::definitions();
        let mut messages = vec![
            Message::system(prompt::system_prompt(self.dialect)),
            Message::user(question),
        ];

        for round in 0..MAX_TOOL_ROUNDS {
            let response = self.llm.chat(&messages, &tools).await?;

            if !response.has_tool_calls() {
                let answer = response.content.trim().to_string();
                if answer.is_empty() {
                    return Err(AppError::query("The model returned an empty answer."));
                }
                debug!("Agent answered after {} tool round(s)", round);
                return Ok(answer);
            }

            messages.push(Message::assistant_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            for tool_call in &response.tool_calls {
                let summary = SqlToolkit::call_summary(&tool_call.name, &tool_call.arguments);
                let _ = events.send(AgentEvent::ToolCall {
                    name: tool_call.name.clone(),
                    summary,
                });

                let result = self
                    .toolkit
                    .execute(&tool_call.name, &tool_call.arguments)
                    .await;

                let _ = events.send(AgentEvent::ToolResult {
                    name: tool_call.name.clone(),
                    summary: result_summary(&result),
                });

                messages.push(Message::tool_result(&tool_call.id, result));
            }
        }

        warn!("Agent hit the tool round limit without answering");
        Err(AppError::query(format!(
            "The agent did not reach an answer within {MAX_TOOL_ROUNDS} tool rounds."
        )))
    }
}

/// Summarizes a tool result payload for the activity stream.
fn result_summary(payload: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(payload) else {
        return "done".to_string();
    };

    if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
        return format!("error: {error}");
    }
    if let Some(count) = value.get("row_count").and_then(|c| c.as_u64()) {
        return format!("{count} row(s)");
    }
    if let Some(tables) = value.get("tables").and_then(|t| t.as_array()) {
        return format!("{} table(s)", tables.len());
    }
    "done".to_string()
}
