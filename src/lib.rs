//! QueryBuddy - chat with your SQL database.
//!
//! Exposes the core modules for the binary and for integration tests.

pub mod agent;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod session;
pub mod tui;
