//! MySQL database handle.
//!
//! Connects with the host/user/password/database credentials from the setup
//! form and maps the common connection failures to readable messages.

use crate::config::ConnectionConfig;
use crate::db::{
    ColumnInfo, ColumnSchema, DatabaseHandle, QueryResult, Row, TableSchema, Value, MAX_ROWS,
    QUERY_TIMEOUT_SECS,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// MySQL database handle.
#[derive(Debug)]
pub struct MySqlHandle {
    pool: MySqlPool,
}

impl MySqlHandle {
    /// Opens a connection pool from the configured credentials.
    ///
    /// Fails fast; connection errors are not retried.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let url = config.mysql_url()?;

        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&url)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Connected to MySQL database");
        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseHandle for MySqlHandle {
    fn dialect(&self) -> &'static str {
        "mysql"
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::query(format!("Failed to list tables: {e}")))
    }

    async fn describe_tables(&self, tables: &[String]) -> Result<Vec<TableSchema>> {
        let mut schemas = Vec::with_capacity(tables.len());

        for table in tables {
            let rows: Vec<(String, String, String)> = sqlx::query_as(
                r#"
                SELECT column_name, data_type, is_nullable
                FROM information_schema.columns
                WHERE table_schema = DATABASE() AND table_name = ?
                ORDER BY ordinal_position
                "#,
            )
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::query(format!("Failed to describe table '{table}': {e}")))?;

            if rows.is_empty() {
                return Err(AppError::query(format!("Table '{table}' does not exist")));
            }

            let columns = rows
                .into_iter()
                .map(|(name, data_type, is_nullable)| ColumnSchema {
                    name,
                    data_type,
                    is_nullable: is_nullable == "YES",
                })
                .collect();

            schemas.push(TableSchema {
                name: table.clone(),
                columns,
            });
        }

        Ok(schemas)
    }

    async fn run_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let result = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            sqlx::query(sql).fetch_all(&self.pool),
        )
        .await
        .map_err(|_| {
            AppError::query(format!("Query timed out after {QUERY_TIMEOUT_SECS} seconds"))
        })?
        .map_err(|e| format_query_error(e))?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = result
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        let total_rows = result.len();
        let was_truncated = total_rows > MAX_ROWS;
        if was_truncated {
            warn!(
                "Query returned {} rows, truncating to {} rows",
                total_rows, MAX_ROWS
            );
        }

        let rows: Vec<Row> = result.iter().take(MAX_ROWS).map(convert_row).collect();
        let row_count = rows.len();

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            row_count,
            total_rows: Some(total_rows),
            was_truncated,
        })
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a MySqlRow to our Value type.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "BOOLEAN" | "BOOL" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "TINYINT" => row
            .try_get::<Option<i8>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "INT" | "MEDIUMINT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64))
            .unwrap_or(Value::Null),

        "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "DOUBLE" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // DECIMAL, dates, and everything else as text.
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> AppError {
    let (host, user, database) = match config {
        ConnectionConfig::MySql {
            host,
            user,
            database,
            ..
        } => (host.as_str(), user.as_str(), database.as_str()),
        _ => ("unknown", "unknown", "unknown"),
    };

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        AppError::connection(format!(
            "Cannot connect to {host}:3306. Check that the server is running."
        ))
    } else if error_str.contains("access denied") {
        AppError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("unknown database") {
        AppError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        AppError::connection(format!(
            "Connection to {host} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        AppError::connection(error.to_string())
    }
}

/// Formats a query error, preferring the engine's own message.
fn format_query_error(error: sqlx::Error) -> AppError {
    match error.as_database_error() {
        Some(db_error) => AppError::query(format!("ERROR: {}", db_error.message())),
        None => AppError::query(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Live tests live in tests/integration/live_db_test.rs, gated on the
    // QUERYBUDDY_TEST_MYSQL_* variables. Only the error mapping is unit
    // tested here.

    fn test_config() -> ConnectionConfig {
        ConnectionConfig::MySql {
            host: "db.example.com".to_string(),
            user: "reader".to_string(),
            password: "secret".to_string(),
            database: "shop".to_string(),
        }
    }

    #[test]
    fn test_map_access_denied() {
        let err = sqlx::Error::Protocol(
            "Access denied for user 'reader'@'localhost' (using password: YES)".into(),
        );
        let mapped = map_connection_error(err, &test_config());
        assert!(matches!(mapped, AppError::Connection(_)));
        assert!(mapped.to_string().contains("Authentication failed"));
        assert!(mapped.to_string().contains("reader"));
    }

    #[test]
    fn test_map_unknown_database() {
        let err = sqlx::Error::Protocol("Unknown database 'shop'".into());
        let mapped = map_connection_error(err, &test_config());
        assert!(mapped.to_string().contains("'shop' does not exist"));
    }

    #[test]
    fn test_map_connection_refused() {
        let err = sqlx::Error::Protocol("Connection refused (os error 111)".into());
        let mapped = map_connection_error(err, &test_config());
        assert!(mapped.to_string().contains("db.example.com:3306"));
    }
}
