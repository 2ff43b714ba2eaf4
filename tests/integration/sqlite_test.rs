//! End-to-end tests for the local SQLite mode.
//!
//! Each test builds a real database file in a temp directory, then goes
//! through the public connect path like the setup form does.

use querybuddy::config::ConnectionConfig;
use querybuddy::db::{self, Value};
use querybuddy::error::AppError;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use std::path::Path;

/// Creates a small music database at the given path.
async fn create_music_db(path: &Path) {
    let mut conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .connect()
        .await
        .expect("create fixture database");

    sqlx::query(
        "CREATE TABLE albums (id INTEGER PRIMARY KEY, title TEXT NOT NULL, year INTEGER)",
    )
    .execute(&mut conn)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO albums (title, year) VALUES
            ('Blue Train', 1957),
            ('Kind of Blue', 1959),
            ('A Love Supreme', 1965)",
    )
    .execute(&mut conn)
    .await
    .unwrap();

    conn.close().await.unwrap();
}

fn local_file_config(path: &Path) -> ConnectionConfig {
    ConnectionConfig::LocalFile {
        path: Some(path.to_path_buf()),
    }
}

#[tokio::test]
async fn test_connect_list_describe_query() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("music.db");
    create_music_db(&path).await;

    let handle = db::connect(&local_file_config(&path)).await.unwrap();
    assert_eq!(handle.dialect(), "sqlite");

    let tables = handle.list_tables().await.unwrap();
    assert_eq!(tables, vec!["albums".to_string()]);

    let schemas = handle
        .describe_tables(&["albums".to_string()])
        .await
        .unwrap();
    assert_eq!(schemas.len(), 1);
    assert_eq!(schemas[0].name, "albums");
    let column_names: Vec<&str> = schemas[0]
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(column_names, vec!["id", "title", "year"]);

    let result = handle
        .run_query("SELECT title FROM albums WHERE year < 1960 ORDER BY year")
        .await
        .unwrap();
    assert_eq!(result.row_count, 2);
    assert_eq!(result.rows[0][0], Value::String("Blue Train".to_string()));
    assert!(!result.was_truncated);
}

#[tokio::test]
async fn test_aggregate_comes_back_as_integer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("music.db");
    create_music_db(&path).await;

    let handle = db::connect(&local_file_config(&path)).await.unwrap();
    let result = handle
        .run_query("SELECT COUNT(*) AS n FROM albums")
        .await
        .unwrap();

    assert_eq!(result.row_count, 1);
    assert_eq!(result.rows[0][0], Value::Int(3));
}

#[tokio::test]
async fn test_writes_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("music.db");
    create_music_db(&path).await;

    let handle = db::connect(&local_file_config(&path)).await.unwrap();
    let err = handle
        .run_query("INSERT INTO albums (title) VALUES ('Giant Steps')")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Query(_)));
    assert!(err.to_string().to_lowercase().contains("readonly"));
}

#[tokio::test]
async fn test_queries_survive_source_file_removal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("music.db");
    create_music_db(&path).await;

    let handle = db::connect(&local_file_config(&path)).await.unwrap();

    // The handle works off a private copy, not the original file.
    std::fs::remove_file(&path).unwrap();

    let result = handle.run_query("SELECT COUNT(*) FROM albums").await.unwrap();
    assert_eq!(result.rows[0][0], Value::Int(3));
}

#[tokio::test]
async fn test_large_result_is_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("music.db");
    create_music_db(&path).await;

    let handle = db::connect(&local_file_config(&path)).await.unwrap();
    let result = handle
        .run_query(
            "WITH RECURSIVE cnt(x) AS (
                SELECT 1 UNION ALL SELECT x + 1 FROM cnt WHERE x < 1200
            ) SELECT x FROM cnt",
        )
        .await
        .unwrap();

    assert!(result.was_truncated);
    assert_eq!(result.row_count, 1000);
    assert_eq!(result.total_rows, Some(1200));
}

#[tokio::test]
async fn test_sql_error_reaches_the_caller() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("music.db");
    create_music_db(&path).await;

    let handle = db::connect(&local_file_config(&path)).await.unwrap();
    let err = handle
        .run_query("SELECT * FROM no_such_table")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Query(_)));
    assert!(err.to_string().contains("no_such_table"));
}

#[tokio::test]
async fn test_non_database_file_fails_on_query() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "this is not a database").unwrap();

    // SQLite may defer the format check to the first read.
    match db::connect(&local_file_config(&path)).await {
        Ok(handle) => {
            assert!(handle.list_tables().await.is_err());
        }
        Err(err) => {
            assert!(matches!(err, AppError::Connection(_)));
        }
    }
}
