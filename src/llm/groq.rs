//! Groq LLM client implementation.
//!
//! Talks to Groq's OpenAI-compatible chat-completions endpoint with tool
//! calling enabled. Requests are not retried; failures surface to the turn
//! that issued them.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::llm::types::{LlmResponse, Message, ToolCall, ToolDefinition};
use crate::llm::LlmClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Groq chat-completions endpoint (OpenAI-compatible).
const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default model, matching the app's original choice.
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

/// Groq client configuration.
#[derive(Debug, Clone)]
pub struct GroqConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model to use (e.g., "llama3-8b-8192").
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl GroqConfig {
    /// Creates a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

}

/// Groq LLM client.
#[derive(Debug, Clone)]
pub struct GroqClient {
    config: GroqConfig,
    client: Client,
}

impl GroqClient {
    /// Creates a new Groq client with the given configuration.
    ///
    /// Failure here means the agent cannot be set up at all.
    pub fn new(config: GroqConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::agent_setup(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Converts internal messages to the wire format.
    fn convert_messages(messages: &[Message]) -> Vec<GroqMessage> {
        messages
            .iter()
            .map(|m| GroqMessage {
                role: m.role.as_str().to_string(),
                content: Some(m.content.clone()),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(m.tool_calls.iter().map(GroqToolCall::from).collect())
                },
                tool_call_id: m.tool_call_id.clone(),
            })
            .collect()
    }

    /// Converts tool definitions to the wire format.
    fn convert_tools(tools: &[ToolDefinition]) -> Option<Vec<GroqTool>> {
        if tools.is_empty() {
            return None;
        }
        Some(
            tools
                .iter()
                .map(|t| GroqTool {
                    kind: "function".to_string(),
                    function: GroqFunctionDef {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: t.parameters.clone(),
                    },
                })
                .collect(),
        )
    }

    /// Parses an API error response into a readable message.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> AppError {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return AppError::query("Authentication failed. Check your Groq API key.");
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return AppError::query("Rate limited by the Groq API. Please wait and try again.");
        }

        if let Ok(error_response) = serde_json::from_str::<GroqErrorResponse>(body) {
            return AppError::query(format!("Groq API error: {}", error_response.error.message));
        }

        AppError::query(format!("Groq API error ({status}): {body}"))
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn chat(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<LlmResponse> {
        let request = GroqRequest {
            model: self.config.model.clone(),
            messages: Self::convert_messages(messages),
            tools: Self::convert_tools(tools),
        };

        debug!(
            "Groq API request: {} messages, {} tools",
            messages.len(),
            tools.len()
        );

        let response = self
            .client
            .post(GROQ_API_URL)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::query("Request to the Groq API timed out. Try again.")
                } else if e.is_connect() {
                    AppError::query("Failed to connect to the Groq API. Check your network.")
                } else {
                    AppError::query(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::query(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        let response: GroqResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::query(format!("Failed to parse response: {e}")))?;

        let message = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| AppError::query("Empty response from the Groq API"))?;

        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(LlmResponse {
            content: message.content.unwrap_or_default(),
            tool_calls,
        })
    }
}

// Wire types for the OpenAI-compatible API

#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GroqTool>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroqMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<GroqToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroqToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: GroqFunctionCall,
}

impl From<&ToolCall> for GroqToolCall {
    fn from(tc: &ToolCall) -> Self {
        Self {
            id: tc.id.clone(),
            kind: "function".to_string(),
            function: GroqFunctionCall {
                name: tc.name.clone(),
                arguments: tc.arguments.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GroqFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct GroqTool {
    #[serde(rename = "type")]
    kind: String,
    function: GroqFunctionDef,
}

#[derive(Debug, Serialize)]
struct GroqFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
}

#[derive(Debug, Deserialize)]
struct GroqResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<GroqToolCall>>,
}

#[derive(Debug, Deserialize)]
struct GroqErrorResponse {
    error: GroqError,
}

#[derive(Debug, Deserialize)]
struct GroqError {
    message: String,
}
