//! Database schema migrations
//!
//! Versioned, idempotent upgrades for databases created by older releases.
//! `CREATE TABLE IF NOT EXISTS` in [`crate::db::init`] always creates the
//! current layout, so every migration must tolerate already being applied.
//!
//! Never edit a released migration; add a new one and bump
//! [`CURRENT_SCHEMA_VERSION`].

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i64 = 3;

/// Latest applied version (0 when none)
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i64> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
    }

    if current_version < 3 {
        migrate_v3(pool).await?;
        set_schema_version(pool, 3).await?;
    }

    info!("All migrations completed successfully");
    Ok(())
}

/// Add `column` to `table` unless the table is absent or already has it
async fn add_column_if_missing(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    declaration: &str,
) -> Result<bool> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?)",
    )
    .bind(table)
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(false);
    }

    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?",
    )
    .bind(table)
    .bind(column)
    .fetch_one(pool)
    .await?;

    if has_column > 0 {
        return Ok(false);
    }

    // Identifiers come from the constants below, never from user input
    sqlx::query(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, declaration))
        .execute(pool)
        .await?;

    info!("  Added {}.{}", table, column);
    Ok(true)
}

/// v1: demographic group on student profiles (fairness reporting)
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    add_column_if_missing(pool, "student_profiles", "demographic_group", "TEXT").await?;
    Ok(())
}

/// v2: anonymization marker for the retention sweep
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    add_column_if_missing(pool, "users", "anonymized_at", "TIMESTAMP").await?;
    Ok(())
}

/// v3: lookup indexes
async fn migrate_v3(pool: &SqlitePool) -> Result<()> {
    let statements = [
        "CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status)",
        "CREATE INDEX IF NOT EXISTS idx_applications_user ON job_applications(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_audit_log_created ON audit_log(created_at)",
        "CREATE INDEX IF NOT EXISTS idx_users_deleted ON users(deleted_at)",
    ];

    for sql in statements {
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}
