//! Analytics rollup job

use crate::db;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::info;
use ucep_common::db::DailyAnalytics;
use ucep_common::Result;

/// Recompute the analytics row for `day`
pub async fn run_rollup(pool: &SqlitePool, day: NaiveDate) -> Result<DailyAnalytics> {
    let analytics = db::analytics::rollup_day(pool, day).await?;

    info!(
        day = %analytics.day,
        new_users = analytics.new_users,
        jobs_posted = analytics.jobs_posted,
        applications = analytics.applications,
        event_rsvps = analytics.event_rsvps,
        "Analytics rollup complete"
    );

    Ok(analytics)
}
