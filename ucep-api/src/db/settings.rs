//! Settings database operations
//!
//! Typed accessors over the key-value `settings` table. Missing or NULL
//! values fall back to the compiled defaults.

use sqlx::SqlitePool;
use ucep_common::{Error, Result};

pub const AUDIT_RETENTION_DAYS: &str = "audit_retention_days";
pub const USER_ANONYMIZE_AFTER_DAYS: &str = "user_anonymize_after_days";
pub const ANALYTICS_RETENTION_DAYS: &str = "analytics_retention_days";
pub const SCHEDULER_INTERVAL_SECS: &str = "scheduler_interval_secs";

/// Retention ages read at the start of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionSettings {
    pub audit_retention_days: u32,
    pub user_anonymize_after_days: u32,
    pub analytics_retention_days: u32,
}

pub async fn retention_settings(db: &SqlitePool) -> Result<RetentionSettings> {
    Ok(RetentionSettings {
        audit_retention_days: get_setting(db, AUDIT_RETENTION_DAYS).await?.unwrap_or(365),
        user_anonymize_after_days: get_setting(db, USER_ANONYMIZE_AFTER_DAYS)
            .await?
            .unwrap_or(30),
        analytics_retention_days: get_setting(db, ANALYTICS_RETENTION_DAYS)
            .await?
            .unwrap_or(730),
    })
}

/// Background job tick period (minimum 1 second)
pub async fn scheduler_interval_secs(db: &SqlitePool) -> Result<u64> {
    Ok(get_setting::<u64>(db, SCHEDULER_INTERVAL_SECS)
        .await?
        .unwrap_or(3600)
        .max(1))
}

/// Generic setting getter
pub async fn get_setting<T>(db: &SqlitePool, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(db)
            .await?;

    match value.flatten() {
        Some(value) => {
            let parsed = value
                .trim()
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting '{}' failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter
pub async fn set_setting<T>(db: &SqlitePool, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_test_db;

    #[tokio::test]
    async fn test_defaults_after_init() {
        let (pool, _dir) = setup_test_db().await;
        let retention = retention_settings(&pool).await.unwrap();
        assert_eq!(
            retention,
            RetentionSettings {
                audit_retention_days: 365,
                user_anonymize_after_days: 30,
                analytics_retention_days: 730,
            }
        );
        assert_eq!(scheduler_interval_secs(&pool).await.unwrap(), 3600);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (pool, _dir) = setup_test_db().await;
        set_setting(&pool, AUDIT_RETENTION_DAYS, 10).await.unwrap();
        assert_eq!(get_setting::<u32>(&pool, AUDIT_RETENTION_DAYS).await.unwrap(), Some(10));

        set_setting(&pool, SCHEDULER_INTERVAL_SECS, 0).await.unwrap();
        assert_eq!(scheduler_interval_secs(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_value_is_config_error() {
        let (pool, _dir) = setup_test_db().await;
        set_setting(&pool, AUDIT_RETENTION_DAYS, "forever").await.unwrap();
        assert!(matches!(
            retention_settings(&pool).await,
            Err(Error::Config(_))
        ));
        assert_eq!(get_setting::<u32>(&pool, "no_such_key").await.unwrap(), None);
    }
}
