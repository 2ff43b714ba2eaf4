//! Database abstraction layer for QueryBuddy.
//!
//! Provides a trait-based interface over the three supported backends
//! (SQLite file, MySQL, PostgreSQL) so the agent toolkit can work against
//! any of them interchangeably.

pub mod cache;
mod mock;
mod mysql;
mod postgres;
mod sqlite;
mod types;

pub use cache::HandleCache;
pub use mock::{FailingDatabaseHandle, MockDatabaseHandle};
pub use mysql::MySqlHandle;
pub use postgres::PostgresHandle;
pub use sqlite::SqliteHandle;
pub use types::{ColumnInfo, ColumnSchema, QueryResult, Row, TableSchema, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Query timeout in seconds, applied by every backend.
pub(crate) const QUERY_TIMEOUT_SECS: u64 = 30;

/// Maximum rows returned from a query before truncation.
pub(crate) const MAX_ROWS: usize = 1000;

/// Creates a database handle for the given connection configuration.
///
/// This is the central factory function for database connections. The config
/// is validated eagerly; no connection attempt is made for incomplete
/// credentials. Connection failures are surfaced immediately, without
/// retrying.
pub async fn connect(config: &ConnectionConfig) -> Result<Arc<dyn DatabaseHandle>> {
    config.validate()?;

    match config {
        ConnectionConfig::LocalFile { .. } => {
            let handle = SqliteHandle::connect(config).await?;
            Ok(Arc::new(handle))
        }
        ConnectionConfig::MySql { .. } => {
            let handle = MySqlHandle::connect(config).await?;
            Ok(Arc::new(handle))
        }
        ConnectionConfig::HostedPostgres { .. } => {
            let handle = PostgresHandle::connect(config).await?;
            Ok(Arc::new(handle))
        }
    }
}

/// Trait defining the interface the agent toolkit needs from a database.
///
/// All operations are async and return Results with AppError.
#[async_trait]
pub trait DatabaseHandle: std::fmt::Debug + Send + Sync {
    /// The SQL dialect name, included in the agent's system prompt.
    fn dialect(&self) -> &'static str;

    /// Lists the user table names, sorted.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Describes the schema of the named tables.
    async fn describe_tables(&self, tables: &[String]) -> Result<Vec<TableSchema>>;

    /// Executes a SQL query and returns the (possibly truncated) results.
    async fn run_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
