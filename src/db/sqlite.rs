//! SQLite database handle for the local-file mode.
//!
//! The selected file is copied to a private temporary file and opened
//! read-only, so the user's original database is never touched and the agent
//! cannot write through this handle.

use crate::config::ConnectionConfig;
use crate::db::{
    ColumnInfo, ColumnSchema, DatabaseHandle, QueryResult, Row, TableSchema, Value, MAX_ROWS,
    QUERY_TIMEOUT_SECS,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// SQLite database handle over a private read-only copy.
#[derive(Debug)]
pub struct SqliteHandle {
    pool: SqlitePool,
    // Held so the temp copy outlives the pool.
    _db_copy: NamedTempFile,
}

impl SqliteHandle {
    /// Copies the configured file to a temp location and opens it read-only.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let ConnectionConfig::LocalFile { path } = config else {
            return Err(AppError::internal(
                "SqliteHandle::connect called with a non-local-file config",
            ));
        };
        let path = path
            .as_deref()
            .ok_or_else(|| AppError::config("Please provide a SQLite database file to upload."))?;

        let db_copy = copy_to_tempfile(path)?;

        let options = SqliteConnectOptions::new()
            .filename(db_copy.path())
            .read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::connection(format!(
                    "Failed to open '{}' as a SQLite database: {e}",
                    path.display()
                ))
            })?;

        debug!("Opened read-only SQLite copy of {}", path.display());

        Ok(Self {
            pool,
            _db_copy: db_copy,
        })
    }
}

/// Reads the database file and writes it to a private temp file.
fn copy_to_tempfile(path: &Path) -> Result<NamedTempFile> {
    if !path.is_file() {
        return Err(AppError::config(format!(
            "SQLite database file '{}' does not exist.",
            path.display()
        )));
    }

    let bytes = std::fs::read(path).map_err(|e| {
        AppError::connection(format!("Failed to read '{}': {e}", path.display()))
    })?;

    let mut tmp = NamedTempFile::new()
        .map_err(|e| AppError::connection(format!("Failed to create temp file: {e}")))?;
    tmp.write_all(&bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| AppError::connection(format!("Failed to write temp copy: {e}")))?;

    Ok(tmp)
}

#[async_trait]
impl DatabaseHandle for SqliteHandle {
    fn dialect(&self) -> &'static str {
        "sqlite"
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT name
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::query(format!("Failed to list tables: {e}")))
    }

    async fn describe_tables(&self, tables: &[String]) -> Result<Vec<TableSchema>> {
        let mut schemas = Vec::with_capacity(tables.len());

        for table in tables {
            // PRAGMA arguments cannot be bound, so the name is quoted inline.
            let pragma = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));

            let rows: Vec<(i64, String, String, i64, Option<String>, i64)> =
                sqlx::query_as(&pragma).fetch_all(&self.pool).await.map_err(|e| {
                    AppError::query(format!("Failed to describe table '{table}': {e}"))
                })?;

            if rows.is_empty() {
                return Err(AppError::query(format!("Table '{table}' does not exist")));
            }

            let columns = rows
                .into_iter()
                .map(|(_cid, name, data_type, notnull, _default, _pk)| ColumnSchema {
                    name,
                    data_type,
                    is_nullable: notnull == 0,
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
        .map_err(|e| AppError::query(format_query_error(e)))?;

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

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a SqliteRow to our Value type.
fn convert_value(row: &SqliteRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "BOOLEAN" | "BOOL" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "INTEGER" | "INT" | "INT4" | "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "REAL" | "FLOAT" | "DOUBLE" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BLOB" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        // SQLite is loosely typed; everything else comes back as text.
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Formats a sqlx error for display, preferring the engine's own message.
fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => format!("ERROR: {}", db_error.message()),
        None => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_connect_missing_file_is_config_error() {
        let config = ConnectionConfig::LocalFile {
            path: Some(PathBuf::from("/nonexistent/path/chinook.db")),
        };

        let err = SqliteHandle::connect(&config).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_connect_no_path_is_config_error() {
        let config = ConnectionConfig::LocalFile { path: None };
        let err = SqliteHandle::connect(&config).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_copy_to_tempfile_preserves_bytes() {
        let mut src = NamedTempFile::new().unwrap();
        src.write_all(b"not actually a database").unwrap();
        src.flush().unwrap();

        let copy = copy_to_tempfile(src.path()).unwrap();
        let bytes = std::fs::read(copy.path()).unwrap();
        assert_eq!(bytes, b"not actually a database");
        assert_ne!(copy.path(), src.path());
    }
}
