//! Integration tests for QueryBuddy.

pub mod agent_flow_test;
pub mod cache_test;
pub mod live_db_test;
pub mod sqlite_test;
