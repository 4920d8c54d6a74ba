//! Campus events and RSVPs

use super::{clean_text, new_guid, require_text};
use super::users::require_active_user;
use crate::pagination::{calculate_pagination, Page, PAGE_SIZE};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use ucep_common::db::Event;
use ucep_common::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: Option<String>,
    /// RFC 3339 start time
    pub starts_at: String,
    /// `None` means unlimited
    pub capacity: Option<i64>,
    pub created_by: String,
}

const EVENT_SELECT: &str = "SELECT e.guid, e.title, e.description, e.location, e.starts_at, \
     e.capacity, e.created_by, e.created_at, \
     (SELECT COUNT(*) FROM event_rsvps r WHERE r.event_id = e.guid) AS rsvp_count \
     FROM events e";

fn event_from_row(row: &SqliteRow) -> Event {
    Event {
        guid: row.get("guid"),
        title: row.get("title"),
        description: row.get("description"),
        location: row.get("location"),
        starts_at: row.get("starts_at"),
        capacity: row.get("capacity"),
        created_by: row.get("created_by"),
        rsvp_count: row.get("rsvp_count"),
        created_at: row.get("created_at"),
    }
}

pub async fn create_event(pool: &SqlitePool, input: &NewEvent) -> Result<Event> {
    let title = require_text(&input.title, "title")?;

    let starts_at = chrono::DateTime::parse_from_rfc3339(input.starts_at.trim())
        .map_err(|_| {
            Error::InvalidInput(format!("starts_at is not an RFC 3339 time: {}", input.starts_at))
        })?
        .with_timezone(&chrono::Utc)
        .to_rfc3339();

    if let Some(capacity) = input.capacity {
        if capacity < 1 {
            return Err(Error::InvalidInput(format!("capacity must be at least 1, got {}", capacity)));
        }
    }

    require_active_user(pool, &input.created_by).await?;

    let guid = new_guid();
    sqlx::query(
        "INSERT INTO events (guid, title, description, location, starts_at, capacity, created_by)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(&title)
    .bind(input.description.trim())
    .bind(clean_text(input.location.as_deref()))
    .bind(&starts_at)
    .bind(input.capacity)
    .bind(&input.created_by)
    .execute(pool)
    .await?;

    require_event(pool, &guid).await
}

pub async fn require_event(pool: &SqlitePool, guid: &str) -> Result<Event> {
    let row = sqlx::query(&format!("{} WHERE e.guid = ?", EVENT_SELECT))
        .bind(guid)
        .fetch_optional(pool)
        .await?;

    row.as_ref()
        .map(event_from_row)
        .ok_or_else(|| Error::NotFound(format!("Event {}", guid)))
}

/// Paged events in start order
pub async fn list_events(pool: &SqlitePool, requested_page: i64) -> Result<Page<Event>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
        .fetch_one(pool)
        .await?;

    let pagination = calculate_pagination(total, requested_page);

    let rows = sqlx::query(&format!(
        "{} ORDER BY e.starts_at, e.rowid LIMIT ? OFFSET ?",
        EVENT_SELECT
    ))
    .bind(PAGE_SIZE)
    .bind(pagination.offset)
    .fetch_all(pool)
    .await?;

    Ok(Page::new(rows.iter().map(event_from_row).collect(), total, pagination))
}

/// RSVP a user; the capacity check and insert are one statement
pub async fn rsvp(pool: &SqlitePool, event_id: &str, user_id: &str) -> Result<Event> {
    require_event(pool, event_id).await?;
    require_active_user(pool, user_id).await?;

    let inserted = sqlx::query(
        "INSERT INTO event_rsvps (event_id, user_id)
         SELECT ?1, ?2
         WHERE (SELECT capacity FROM events WHERE guid = ?1) IS NULL
            OR (SELECT COUNT(*) FROM event_rsvps WHERE event_id = ?1)
               < (SELECT capacity FROM events WHERE guid = ?1)",
    )
    .bind(event_id)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();

    if inserted == 0 {
        return Err(Error::Conflict(format!("Event {} is full", event_id)));
    }

    require_event(pool, event_id).await
}

pub async fn cancel_rsvp(pool: &SqlitePool, event_id: &str, user_id: &str) -> Result<()> {
    let removed = sqlx::query("DELETE FROM event_rsvps WHERE event_id = ? AND user_id = ?")
        .bind(event_id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();

    if removed == 0 {
        return Err(Error::NotFound(format!("RSVP for user {} on event {}", user_id, event_id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_test_db;
    use crate::db::users::{create_user, NewUser};
    use ucep_common::db::UserRole;

    async fn user(pool: &SqlitePool) -> String {
        create_user(
            pool,
            &NewUser {
                email: format!("{}@uni.edu", new_guid()),
                display_name: "Attendee".to_string(),
                role: UserRole::Student,
            },
        )
        .await
        .unwrap()
        .guid
    }

    fn event(created_by: &str, capacity: Option<i64>) -> NewEvent {
        NewEvent {
            title: "Career Fair".to_string(),
            description: String::new(),
            location: Some("Main Hall".to_string()),
            starts_at: "2026-10-01T15:00:00-04:00".to_string(),
            capacity,
            created_by: created_by.to_string(),
        }
    }

    #[tokio::test]
    async fn test_capacity_enforced() {
        let (pool, _dir) = setup_test_db().await;
        let host = user(&pool).await;
        let created = create_event(&pool, &event(&host, Some(1))).await.unwrap();
        assert_eq!(created.starts_at, "2026-10-01T19:00:00+00:00");

        let first = user(&pool).await;
        let second = user(&pool).await;

        let updated = rsvp(&pool, &created.guid, &first).await.unwrap();
        assert_eq!(updated.rsvp_count, 1);

        assert!(matches!(
            rsvp(&pool, &created.guid, &second).await,
            Err(Error::Conflict(_))
        ));

        cancel_rsvp(&pool, &created.guid, &first).await.unwrap();
        rsvp(&pool, &created.guid, &second).await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_rsvp_is_unique_violation() {
        let (pool, _dir) = setup_test_db().await;
        let host = user(&pool).await;
        let created = create_event(&pool, &event(&host, None)).await.unwrap();
        let guest = user(&pool).await;

        rsvp(&pool, &created.guid, &guest).await.unwrap();
        assert!(matches!(
            rsvp(&pool, &created.guid, &guest).await,
            Err(Error::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_missing_rsvp() {
        let (pool, _dir) = setup_test_db().await;
        assert!(matches!(
            cancel_rsvp(&pool, "e", "u").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_start_time() {
        let (pool, _dir) = setup_test_db().await;
        let host = user(&pool).await;
        let mut bad = event(&host, None);
        bad.starts_at = "tomorrow".to_string();
        assert!(matches!(create_event(&pool, &bad).await, Err(Error::InvalidInput(_))));
    }
}
