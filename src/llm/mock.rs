//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on input patterns, plus a scripted
//! mode for exercising multi-round tool loops.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{AppError, Result};
use crate::llm::types::{LlmResponse, Message, Role, ToolCall, ToolDefinition};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses.
///
/// Scripted responses (if any) are consumed first, in order. After the
/// script is exhausted, pattern matching on the last user message applies.
/// Used for unit testing and `--mock-llm` mode without real API calls.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    /// Responses returned in order before pattern matching kicks in.
    script: Mutex<VecDeque<LlmResponse>>,
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// Error to return on every call instead of a response.
    failure: Option<String>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock client that fails every request.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Queues a scripted response, returned before any pattern matching.
    pub fn with_scripted(self, response: LlmResponse) -> Self {
        self.script.lock().unwrap().push_back(response);
        self
    }

    /// Queues a scripted tool call for `run_sql_query` with the given SQL.
    pub fn with_scripted_query(self, id: &str, sql: &str) -> Self {
        self.with_scripted(LlmResponse::with_tool_calls(
            "",
            vec![ToolCall {
                id: id.to_string(),
                name: "run_sql_query".to_string(),
                arguments: serde_json::json!({ "sql": sql }).to_string(),
            }],
        ))
    }

    /// Adds a custom response mapping.
    ///
    /// When the last user message contains `pattern`, the mock returns
    /// `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Generates a mock text response based on the input.
    fn mock_response(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if input_lower.contains("hello") || input_lower.contains("hi") {
            return "Hello! Ask me anything about your database.".to_string();
        }

        "I don't understand that question. Could you please rephrase it?".to_string()
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn chat(&self, messages: &[Message], _tools: &[ToolDefinition]) -> Result<LlmResponse> {
        if let Some(message) = &self.failure {
            return Err(AppError::query(message.clone()));
        }

        if let Some(scripted) = self.script.lock().unwrap().pop_front() {
            return Ok(scripted);
        }

        let input = Self::extract_user_input(messages);
        Ok(LlmResponse::text(self.mock_response(&input)))
    }
}
