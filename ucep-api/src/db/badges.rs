//! Badges and awards

use super::users::require_active_user;
use super::{new_guid, require_text};
use sqlx::{Row, SqlitePool};
use ucep_common::db::{Badge, BadgeAward};
use ucep_common::{Error, Result};

pub async fn create_badge(pool: &SqlitePool, name: &str, description: &str) -> Result<Badge> {
    let badge = Badge {
        guid: new_guid(),
        name: require_text(name, "name")?,
        description: description.trim().to_string(),
    };

    sqlx::query("INSERT INTO badges (guid, name, description) VALUES (?, ?, ?)")
        .bind(&badge.guid)
        .bind(&badge.name)
        .bind(&badge.description)
        .execute(pool)
        .await?;

    Ok(badge)
}

async fn require_badge(pool: &SqlitePool, guid: &str) -> Result<Badge> {
    let row = sqlx::query("SELECT guid, name, description FROM badges WHERE guid = ?")
        .bind(guid)
        .fetch_optional(pool)
        .await?;

    row.map(|row| Badge {
        guid: row.get("guid"),
        name: row.get("name"),
        description: row.get("description"),
    })
    .ok_or_else(|| Error::NotFound(format!("Badge {}", guid)))
}

/// Award a badge; awarding the same badge twice is a unique violation
pub async fn award_badge(pool: &SqlitePool, badge_id: &str, user_id: &str) -> Result<BadgeAward> {
    let badge = require_badge(pool, badge_id).await?;
    require_active_user(pool, user_id).await?;

    sqlx::query("INSERT INTO badge_awards (badge_id, user_id) VALUES (?, ?)")
        .bind(badge_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    let awarded_at: String = sqlx::query_scalar(
        "SELECT awarded_at FROM badge_awards WHERE badge_id = ? AND user_id = ?",
    )
    .bind(badge_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(BadgeAward {
        badge_id: badge.guid,
        badge_name: badge.name,
        user_id: user_id.to_string(),
        awarded_at,
    })
}

pub async fn list_user_badges(pool: &SqlitePool, user_id: &str) -> Result<Vec<BadgeAward>> {
    let rows = sqlx::query(
        "SELECT a.badge_id, b.name, a.user_id, a.awarded_at
         FROM badge_awards a
         JOIN badges b ON b.guid = a.badge_id
         WHERE a.user_id = ?
         ORDER BY a.awarded_at, b.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| BadgeAward {
            badge_id: row.get("badge_id"),
            badge_name: row.get("name"),
            user_id: row.get("user_id"),
            awarded_at: row.get("awarded_at"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_test_db;
    use crate::db::users::{create_user, NewUser};
    use ucep_common::db::UserRole;

    #[tokio::test]
    async fn test_award_and_list() {
        let (pool, _dir) = setup_test_db().await;
        let user = create_user(
            &pool,
            &NewUser {
                email: "winner@uni.edu".to_string(),
                display_name: "Winner".to_string(),
                role: UserRole::Student,
            },
        )
        .await
        .unwrap();

        let badge = create_badge(&pool, "First Application", "Applied to a job").await.unwrap();
        let award = award_badge(&pool, &badge.guid, &user.guid).await.unwrap();
        assert_eq!(award.badge_name, "First Application");

        let listed = list_user_badges(&pool, &user.guid).await.unwrap();
        assert_eq!(listed.len(), 1);

        assert!(matches!(
            award_badge(&pool, &badge.guid, &user.guid).await,
            Err(Error::Database(_))
        ));
        assert!(matches!(
            award_badge(&pool, "missing", &user.guid).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_badge_name() {
        let (pool, _dir) = setup_test_db().await;
        create_badge(&pool, "Mentor", "").await.unwrap();
        assert!(create_badge(&pool, "Mentor", "again").await.is_err());
    }
}
