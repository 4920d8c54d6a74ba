//! Audit log

use crate::pagination::{calculate_pagination, Page, PAGE_SIZE};
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use ucep_common::db::AuditLogEntry;
use ucep_common::Result;

/// Append an audit entry
pub async fn record(
    pool: &SqlitePool,
    actor_id: Option<&str>,
    action: &str,
    target: Option<(&str, &str)>,
    details: Option<&Value>,
) -> Result<()> {
    let (target_type, target_id) = target.unzip();

    sqlx::query(
        "INSERT INTO audit_log (actor_id, action, target_type, target_id, details)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(actor_id)
    .bind(action)
    .bind(target_type)
    .bind(target_id)
    .bind(details.map(Value::to_string))
    .execute(pool)
    .await?;

    Ok(())
}

/// Paged audit entries, newest first
pub async fn list_entries(pool: &SqlitePool, requested_page: i64) -> Result<Page<AuditLogEntry>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log")
        .fetch_one(pool)
        .await?;

    let pagination = calculate_pagination(total, requested_page);

    let rows = sqlx::query(
        "SELECT id, actor_id, action, target_type, target_id, details, created_at
         FROM audit_log ORDER BY id DESC LIMIT ? OFFSET ?",
    )
    .bind(PAGE_SIZE)
    .bind(pagination.offset)
    .fetch_all(pool)
    .await?;

    let entries = rows
        .iter()
        .map(|row| {
            // Unparseable details are surfaced as a plain string
            let details = row
                .get::<Option<String>, _>("details")
                .map(|raw| serde_json::from_str(&raw).unwrap_or(Value::String(raw)));

            AuditLogEntry {
                id: row.get("id"),
                actor_id: row.get("actor_id"),
                action: row.get("action"),
                target_type: row.get("target_type"),
                target_id: row.get("target_id"),
                details,
                created_at: row.get("created_at"),
            }
        })
        .collect();

    Ok(Page::new(entries, total, pagination))
}

/// Delete entries created before `cutoff` (SQLite datetime text)
pub async fn delete_before(pool: &SqlitePool, cutoff: &str) -> Result<u64> {
    let deleted = sqlx::query("DELETE FROM audit_log WHERE created_at < ?")
        .bind(cutoff)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(deleted)
}
