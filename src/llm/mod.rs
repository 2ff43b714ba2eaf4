//! LLM abstraction layer for QueryBuddy.
//!
//! Provides a trait-based interface over the chat-completions API so the
//! agent can run against the real Groq endpoint or a mock.

mod groq;
mod mock;
mod types;

pub use groq::{GroqClient, GroqConfig};
pub use mock::MockLlmClient;
pub use types::{LlmResponse, Message, Role, ToolCall, ToolDefinition};

use crate::error::Result;
use async_trait::async_trait;

/// Trait for LLM clients with tool-calling support.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends the conversation and tool definitions, returning the model's
    /// reply: either text content, or one or more tool calls to execute.
    async fn chat(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<LlmResponse>;
}
