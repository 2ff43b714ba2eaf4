//! Error types for QueryBuddy.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for QueryBuddy operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors (missing credentials, invalid URI, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Agent or toolkit construction failures.
    #[error("Agent setup error: {0}")]
    AgentSetup(String),

    /// Failures during a single chat turn (LLM call or query execution).
    #[error("Query error: {0}")]
    Query(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates an agent setup error with the given message.
    pub fn agent_setup(msg: impl Into<String>) -> Self {
        Self::AgentSetup(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Connection(_) => "Connection Error",
            Self::AgentSetup(_) => "Agent Setup Error",
            Self::Query(_) => "Query Error",
            Self::Internal(_) => "Internal Error",
        }
    }

}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let err = AppError::config("Please provide all MySQL connection details");
        assert_eq!(
            err.to_string(),
            "Configuration error: Please provide all MySQL connection details"
        );
        assert_eq!(err.category(), "Configuration Error");
    }

    #[test]
    fn test_error_display_connection() {
        let err = AppError::connection("Cannot connect to localhost:3306");
        assert_eq!(
            err.to_string(),
            "Connection error: Cannot connect to localhost:3306"
        );
        assert_eq!(err.category(), "Connection Error");
    }

    #[test]
    fn test_error_display_agent_setup() {
        let err = AppError::agent_setup("Failed to create HTTP client");
        assert_eq!(
            err.to_string(),
            "Agent setup error: Failed to create HTTP client"
        );
        assert_eq!(err.category(), "Agent Setup Error");
    }

    #[test]
    fn test_error_display_query() {
        let err = AppError::query("no such table: users");
        assert_eq!(err.to_string(), "Query error: no such table: users");
        assert_eq!(err.category(), "Query Error");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AppError>();
    }
}
