//! Live-database tests for the MySQL and PostgreSQL backends.
//!
//! These need a reachable server and are skipped unless the matching
//! environment variables are set:
//!
//! - MySQL: `QUERYBUDDY_TEST_MYSQL_HOST`, `QUERYBUDDY_TEST_MYSQL_USER`,
//!   `QUERYBUDDY_TEST_MYSQL_PASSWORD`, `QUERYBUDDY_TEST_MYSQL_DATABASE`
//! - PostgreSQL: `QUERYBUDDY_TEST_POSTGRES_URI`

use querybuddy::config::ConnectionConfig;
use querybuddy::db::{self, Value};
use querybuddy::error::AppError;

fn mysql_config() -> Option<ConnectionConfig> {
    Some(ConnectionConfig::MySql {
        host: std::env::var("QUERYBUDDY_TEST_MYSQL_HOST").ok()?,
        user: std::env::var("QUERYBUDDY_TEST_MYSQL_USER").ok()?,
        password: std::env::var("QUERYBUDDY_TEST_MYSQL_PASSWORD").ok()?,
        database: std::env::var("QUERYBUDDY_TEST_MYSQL_DATABASE").ok()?,
    })
}

fn postgres_config() -> Option<ConnectionConfig> {
    Some(ConnectionConfig::HostedPostgres {
        uri: std::env::var("QUERYBUDDY_TEST_POSTGRES_URI").ok()?,
    })
}

#[tokio::test]
async fn test_mysql_select_round_trip() {
    let Some(config) = mysql_config() else {
        eprintln!("Skipping test: QUERYBUDDY_TEST_MYSQL_* not set");
        return;
    };

    let handle = db::connect(&config).await.unwrap();
    assert_eq!(handle.dialect(), "mysql");

    let result = handle
        .run_query("SELECT 1 AS num, 'hello' AS greeting")
        .await
        .unwrap();

    assert_eq!(result.columns.len(), 2);
    assert_eq!(result.columns[0].name, "num");
    assert_eq!(result.row_count, 1);
    assert_eq!(result.rows[0][0], Value::Int(1));
    assert_eq!(result.rows[0][1], Value::String("hello".to_string()));

    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_mysql_schema_inspection() {
    let Some(config) = mysql_config() else {
        eprintln!("Skipping test: QUERYBUDDY_TEST_MYSQL_* not set");
        return;
    };

    let handle = db::connect(&config).await.unwrap();

    // The configured database may be empty; listing just has to succeed.
    handle.list_tables().await.unwrap();

    let err = handle
        .describe_tables(&["no_such_table_xyz".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Query(_)));
    assert!(err.to_string().contains("no_such_table_xyz"));

    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_postgres_select_round_trip() {
    let Some(config) = postgres_config() else {
        eprintln!("Skipping test: QUERYBUDDY_TEST_POSTGRES_URI not set");
        return;
    };

    let handle = db::connect(&config).await.unwrap();
    assert_eq!(handle.dialect(), "postgresql");

    let result = handle.run_query("SELECT 1 AS num").await.unwrap();

    assert_eq!(result.columns[0].name, "num");
    assert_eq!(result.rows[0][0], Value::Int(1));
    assert!(!result.was_truncated);

    handle.close().await.unwrap();
}

#[tokio::test]
async fn test_postgres_schema_inspection() {
    let Some(config) = postgres_config() else {
        eprintln!("Skipping test: QUERYBUDDY_TEST_POSTGRES_URI not set");
        return;
    };

    let handle = db::connect(&config).await.unwrap();

    handle.list_tables().await.unwrap();

    let err = handle
        .describe_tables(&["no_such_table_xyz".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Query(_)));

    handle.close().await.unwrap();
}
