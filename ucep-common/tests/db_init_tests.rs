//! Database initialization: creation, idempotency, defaults, migrations

use ucep_common::db::{get_schema_version, init_database, CURRENT_SCHEMA_VERSION, DEFAULT_SETTINGS};

#[tokio::test]
async fn test_database_created_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sub").join("ucep.db");

    let pool = init_database(&db_path).await;
    assert!(pool.is_ok(), "Database initialization failed: {:?}", pool.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_reopening_existing_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ucep.db");

    let first = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO users (guid, email, display_name) VALUES ('u1', 'a@b.c', 'A')")
        .execute(&first)
        .await
        .unwrap();
    first.close().await;

    let second = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&second)
        .await
        .unwrap();
    assert_eq!(count, 1, "Existing rows must survive re-initialization");
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("ucep.db")).await.unwrap();

    for (key, value) in DEFAULT_SETTINGS {
        let stored: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored.as_deref(), Some(*value), "setting {}", key);
    }
}

#[tokio::test]
async fn test_null_setting_reset_and_custom_value_kept() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ucep.db");
    let pool = init_database(&db_path).await.unwrap();

    sqlx::query("UPDATE settings SET value = NULL WHERE key = 'audit_retention_days'")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("UPDATE settings SET value = '7' WHERE key = 'user_anonymize_after_days'")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();
    let audit: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'audit_retention_days'")
            .fetch_one(&pool)
            .await
            .unwrap();
    let anonymize: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'user_anonymize_after_days'")
            .fetch_one(&pool)
            .await
            .unwrap();

    assert_eq!(audit.as_deref(), Some("365"));
    assert_eq!(anonymize.as_deref(), Some("7"));
}

#[tokio::test]
async fn test_schema_version_current_after_init() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("ucep.db")).await.unwrap();

    assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
}

#[tokio::test]
async fn test_foreign_keys_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("ucep.db")).await.unwrap();

    let result = sqlx::query(
        "INSERT INTO jobs (guid, employer_id, title) VALUES ('j1', 'missing-user', 'Intern')",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "Insert referencing a missing user must fail");
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("ucep.db")).await.unwrap();

    sqlx::query("INSERT INTO users (guid, email, display_name) VALUES ('u1', 'x@y.z', 'X')")
        .execute(&pool)
        .await
        .unwrap();
    let duplicate =
        sqlx::query("INSERT INTO users (guid, email, display_name) VALUES ('u2', 'x@y.z', 'Y')")
            .execute(&pool)
            .await;

    assert!(duplicate.is_err());
}
