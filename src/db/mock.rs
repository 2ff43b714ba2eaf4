//! Mock database handles for testing.
//!
//! Provides in-memory implementations so the agent loop and the handle cache
//! can be exercised without a real database.

use super::{ColumnInfo, ColumnSchema, DatabaseHandle, QueryResult, TableSchema, Value};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// A mock database handle that returns predefined results.
#[derive(Debug)]
pub struct MockDatabaseHandle {
    tables: Vec<TableSchema>,
    /// (substring pattern, canned result) pairs checked in order.
    query_results: Vec<(String, QueryResult)>,
}

impl MockDatabaseHandle {
    /// Creates a new mock handle with no tables.
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            query_results: Vec::new(),
        }
    }

    /// Adds a table with the given columns (name, type pairs, all nullable).
    pub fn with_table(mut self, name: &str, columns: &[(&str, &str)]) -> Self {
        self.tables.push(TableSchema {
            name: name.to_string(),
            columns: columns
                .iter()
                .map(|(col, ty)| ColumnSchema {
                    name: col.to_string(),
                    data_type: ty.to_string(),
                    is_nullable: true,
                })
                .collect(),
        });
        self
    }

    /// Registers a canned result for queries containing the given substring
    /// (case-insensitive).
    pub fn with_query_result(mut self, pattern: &str, result: QueryResult) -> Self {
        self.query_results.push((pattern.to_lowercase(), result));
        self
    }

    /// Shorthand for a single-cell result, as produced by COUNT queries.
    pub fn with_scalar_result(self, pattern: &str, column: &str, value: Value) -> Self {
        let result =
            QueryResult::with_data(vec![ColumnInfo::new(column, "bigint")], vec![vec![value]]);
        self.with_query_result(pattern, result)
    }
}

impl Default for MockDatabaseHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseHandle for MockDatabaseHandle {
    fn dialect(&self) -> &'static str {
        "sqlite"
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn describe_tables(&self, tables: &[String]) -> Result<Vec<TableSchema>> {
        tables
            .iter()
            .map(|name| {
                self.tables
                    .iter()
                    .find(|t| &t.name == name)
                    .cloned()
                    .ok_or_else(|| AppError::query(format!("Table '{name}' does not exist")))
            })
            .collect()
    }

    async fn run_query(&self, sql: &str) -> Result<QueryResult> {
        let sql_lower = sql.to_lowercase();

        for (pattern, result) in &self.query_results {
            if sql_lower.contains(pattern) {
                return Ok(result.clone());
            }
        }

        // Default: echo the query back as a single text cell.
        let result = QueryResult {
            columns: vec![ColumnInfo::new("result", "text")],
            rows: vec![vec![Value::String(format!("Mock result for: {sql}"))]],
            execution_time: Duration::from_millis(1),
            row_count: 1,
            total_rows: Some(1),
            was_truncated: false,
        };
        Ok(result)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A handle whose every operation fails with a query error.
#[derive(Debug)]
pub struct FailingDatabaseHandle {
    message: String,
}

impl FailingDatabaseHandle {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseHandle for FailingDatabaseHandle {
    fn dialect(&self) -> &'static str {
        "sqlite"
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        Err(AppError::query(self.message.clone()))
    }

    async fn describe_tables(&self, _tables: &[String]) -> Result<Vec<TableSchema>> {
        Err(AppError::query(self.message.clone()))
    }

    async fn run_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(AppError::query(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_tables() {
        let handle = MockDatabaseHandle::new()
            .with_table("users", &[("id", "integer"), ("name", "text")])
            .with_table("orders", &[("id", "integer")]);

        let tables = handle.list_tables().await.unwrap();
        assert_eq!(tables, vec!["users", "orders"]);

        let schemas = handle
            .describe_tables(&["users".to_string()])
            .await
            .unwrap();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].columns.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_describe_unknown_table() {
        let handle = MockDatabaseHandle::new();
        let err = handle
            .describe_tables(&["ghosts".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ghosts"));
    }

    #[tokio::test]
    async fn test_mock_canned_query_result() {
        let handle = MockDatabaseHandle::new().with_scalar_result(
            "count(*)",
            "count",
            Value::Int(42),
        );

        let result = handle
            .run_query("SELECT COUNT(*) FROM users")
            .await
            .unwrap();
        assert_eq!(result.rows[0][0], Value::Int(42));
    }

    #[tokio::test]
    async fn test_failing_handle() {
        let handle = FailingDatabaseHandle::new("no such table: users");
        let err = handle.run_query("SELECT 1").await.unwrap_err();
        assert!(matches!(err, AppError::Query(_)));
    }
}
