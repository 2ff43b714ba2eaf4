//! Handle cache behavior against real connections.

use querybuddy::config::ConnectionConfig;
use querybuddy::db::HandleCache;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

async fn create_empty_db(path: &Path) {
    let mut conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .connect()
        .await
        .expect("create fixture database");
    sqlx::query("CREATE TABLE t (id INTEGER)")
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
async fn test_same_config_reuses_the_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.db");
    create_empty_db(&path).await;

    let mut cache = HandleCache::new();
    let config = local_file_config(&path);

    let first = cache.get_or_connect(&config).await.unwrap();
    let second = cache.get_or_connect(&config).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_different_files_get_different_handles() {
    let dir = tempfile::tempdir().unwrap();
    let path_a = dir.path().join("a.db");
    let path_b = dir.path().join("b.db");
    create_empty_db(&path_a).await;
    create_empty_db(&path_b).await;

    let mut cache = HandleCache::new();
    let a = cache.get_or_connect(&local_file_config(&path_a)).await.unwrap();
    let b = cache.get_or_connect(&local_file_config(&path_b)).await.unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn test_expired_entry_reconnects() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.db");
    create_empty_db(&path).await;

    let mut cache = HandleCache::with_ttl(Duration::ZERO);
    let config = local_file_config(&path);

    let first = cache.get_or_connect(&config).await.unwrap();
    let second = cache.get_or_connect(&config).await.unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_failed_connect_is_not_cached() {
    let mut cache = HandleCache::new();
    let config = local_file_config(Path::new("/nonexistent/missing.db"));

    assert!(cache.get_or_connect(&config).await.is_err());
    assert!(cache.is_empty());

    // A later attempt against a now-valid target is unaffected.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.db");
    create_empty_db(&path).await;
    assert!(cache.get_or_connect(&local_file_config(&path)).await.is_ok());
}
