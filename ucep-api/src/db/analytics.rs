//! Daily analytics rollups

use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use ucep_common::db::DailyAnalytics;
use ucep_common::Result;

fn day_text(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Count activity on `day` and upsert the row
pub async fn rollup_day(pool: &SqlitePool, day: NaiveDate) -> Result<DailyAnalytics> {
    let day = day_text(day);

    let row = sqlx::query(
        "SELECT
            (SELECT COUNT(*) FROM users WHERE date(created_at) = ?1) AS new_users,
            (SELECT COUNT(*) FROM jobs WHERE date(created_at) = ?1) AS jobs_posted,
            (SELECT COUNT(*) FROM job_applications WHERE date(created_at) = ?1) AS applications,
            (SELECT COUNT(*) FROM event_rsvps WHERE date(created_at) = ?1) AS event_rsvps",
    )
    .bind(&day)
    .fetch_one(pool)
    .await?;

    let analytics = DailyAnalytics {
        day,
        new_users: row.get("new_users"),
        jobs_posted: row.get("jobs_posted"),
        applications: row.get("applications"),
        event_rsvps: row.get("event_rsvps"),
    };

    sqlx::query(
        r#"
        INSERT INTO analytics_daily (day, new_users, jobs_posted, applications, event_rsvps)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(day) DO UPDATE SET
            new_users = excluded.new_users,
            jobs_posted = excluded.jobs_posted,
            applications = excluded.applications,
            event_rsvps = excluded.event_rsvps,
            computed_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&analytics.day)
    .bind(analytics.new_users)
    .bind(analytics.jobs_posted)
    .bind(analytics.applications)
    .bind(analytics.event_rsvps)
    .execute(pool)
    .await?;

    Ok(analytics)
}

/// Rollup rows for the `days` most recent days ending at `today`, oldest first
pub async fn list_recent(pool: &SqlitePool, today: NaiveDate, days: u32) -> Result<Vec<DailyAnalytics>> {
    let since = today - chrono::Duration::days(i64::from(days.saturating_sub(1)));

    let rows = sqlx::query(
        "SELECT day, new_users, jobs_posted, applications, event_rsvps
         FROM analytics_daily WHERE day >= ? AND day <= ? ORDER BY day",
    )
    .bind(day_text(since))
    .bind(day_text(today))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| DailyAnalytics {
            day: row.get("day"),
            new_users: row.get("new_users"),
            jobs_posted: row.get("jobs_posted"),
            applications: row.get("applications"),
            event_rsvps: row.get("event_rsvps"),
        })
        .collect())
}

/// Delete rollups for days before `cutoff`
pub async fn delete_before(pool: &SqlitePool, cutoff: NaiveDate) -> Result<u64> {
    let deleted = sqlx::query("DELETE FROM analytics_daily WHERE day < ?")
        .bind(day_text(cutoff))
        .execute(pool)
        .await?
        .rows_affected();

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_test_db;

    #[tokio::test]
    async fn test_rollup_counts_and_upserts() {
        let (pool, _dir) = setup_test_db().await;
        let today = chrono::Utc::now().date_naive();

        sqlx::query("INSERT INTO users (guid, email, display_name) VALUES ('u1', 'a@b.co', 'A')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO users (guid, email, display_name, created_at)
             VALUES ('u2', 'b@b.co', 'B', datetime('now', '-3 days'))",
        )
        .execute(&pool)
        .await
        .unwrap();

        let first = rollup_day(&pool, today).await.unwrap();
        assert_eq!(first.new_users, 1);
        assert_eq!(first.jobs_posted, 0);

        sqlx::query("INSERT INTO users (guid, email, display_name) VALUES ('u3', 'c@b.co', 'C')")
            .execute(&pool)
            .await
            .unwrap();
        let second = rollup_day(&pool, today).await.unwrap();
        assert_eq!(second.new_users, 2);

        let recent = list_recent(&pool, today, 7).await.unwrap();
        assert_eq!(recent, vec![second]);
    }

    #[tokio::test]
    async fn test_delete_before() {
        let (pool, _dir) = setup_test_db().await;
        let old = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let recent = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        rollup_day(&pool, old).await.unwrap();
        rollup_day(&pool, recent).await.unwrap();

        let cutoff = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(delete_before(&pool, cutoff).await.unwrap(), 1);
        assert_eq!(list_recent(&pool, recent, 3650).await.unwrap().len(), 1);
    }
}
