//! Retention sweep
//!
//! One pass:
//! 1. delete audit_log rows older than `audit_retention_days`
//! 2. anonymize users soft-deleted more than `user_anonymize_after_days` ago
//! 3. delete analytics_daily rows older than `analytics_retention_days`
//!
//! Then append a `retention.sweep` audit entry with the counts. Running the
//! sweep twice in a row changes nothing the second time (apart from the new
//! audit entry).

use crate::db;
use crate::db::settings::{
    RetentionSettings, ANALYTICS_RETENTION_DAYS, AUDIT_RETENTION_DAYS, USER_ANONYMIZE_AFTER_DAYS,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;
use ucep_common::{Error, Result};

/// Counts from one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub audit_rows_deleted: u64,
    pub users_anonymized: u64,
    pub analytics_rows_deleted: u64,
}

/// SQLite `CURRENT_TIMESTAMP` format
fn sqlite_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `now` minus `days`, or a config error when the age is out of range
fn days_before(now: DateTime<Utc>, days: u32, key: &str) -> Result<DateTime<Utc>> {
    Duration::try_days(i64::from(days))
        .and_then(|age| now.checked_sub_signed(age))
        .ok_or_else(|| Error::Config(format!("Setting '{}' out of range: {} days", key, days)))
}

/// Run a sweep using the retention ages stored in settings
pub async fn run_retention_sweep(pool: &SqlitePool) -> Result<SweepReport> {
    let settings = db::settings::retention_settings(pool).await?;
    sweep_at(pool, &settings, Utc::now()).await
}

/// Run a sweep as of `now`
pub async fn sweep_at(
    pool: &SqlitePool,
    settings: &RetentionSettings,
    now: DateTime<Utc>,
) -> Result<SweepReport> {
    let audit_cutoff = days_before(now, settings.audit_retention_days, AUDIT_RETENTION_DAYS)?;
    let anonymize_cutoff = days_before(
        now,
        settings.user_anonymize_after_days,
        USER_ANONYMIZE_AFTER_DAYS,
    )?;
    let analytics_cutoff = days_before(
        now,
        settings.analytics_retention_days,
        ANALYTICS_RETENTION_DAYS,
    )?
    .date_naive();

    let audit_rows_deleted = db::audit::delete_before(pool, &sqlite_timestamp(audit_cutoff)).await?;
    let anonymized =
        db::users::anonymize_deleted_users(pool, &sqlite_timestamp(anonymize_cutoff)).await?;
    let analytics_rows_deleted = db::analytics::delete_before(pool, analytics_cutoff).await?;

    let report = SweepReport {
        audit_rows_deleted,
        users_anonymized: anonymized.len() as u64,
        analytics_rows_deleted,
    };

    db::audit::record(
        pool,
        None,
        "retention.sweep",
        None,
        Some(&json!({
            "audit_rows_deleted": report.audit_rows_deleted,
            "users_anonymized": report.users_anonymized,
            "analytics_rows_deleted": report.analytics_rows_deleted,
        })),
    )
    .await?;

    info!(
        audit_rows_deleted = report.audit_rows_deleted,
        users_anonymized = report.users_anonymized,
        analytics_rows_deleted = report.analytics_rows_deleted,
        "Retention sweep complete"
    );

    Ok(report)
}
