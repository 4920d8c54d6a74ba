//! Housing listings

use super::{clean_text, new_guid, require_text};
use super::users::require_active_user;
use crate::pagination::{calculate_pagination, Page, PAGE_SIZE};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use ucep_common::db::HousingListing;
use ucep_common::{Error, Result};

/// Status of a listing open for matching
pub const AVAILABLE: &str = "available";

#[derive(Debug, Clone, Deserialize)]
pub struct NewListing {
    pub owner_id: String,
    pub title: String,
    pub location: Option<String>,
    pub monthly_rent: f64,
    #[serde(default = "default_bedrooms")]
    pub bedrooms: i64,
    /// `YYYY-MM-DD`
    pub available_from: Option<String>,
}

fn default_bedrooms() -> i64 {
    1
}

const LISTING_COLUMNS: &str =
    "guid, owner_id, title, location, monthly_rent, bedrooms, available_from, status, created_at";

fn listing_from_row(row: &SqliteRow) -> HousingListing {
    HousingListing {
        guid: row.get("guid"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        location: row.get("location"),
        monthly_rent: row.get("monthly_rent"),
        bedrooms: row.get("bedrooms"),
        available_from: row.get("available_from"),
        status: row.get("status"),
        created_at: row.get("created_at"),
    }
}

pub async fn create_listing(pool: &SqlitePool, listing: &NewListing) -> Result<HousingListing> {
    let title = require_text(&listing.title, "title")?;

    if !listing.monthly_rent.is_finite() || listing.monthly_rent < 0.0 {
        return Err(Error::InvalidInput(format!(
            "monthly_rent must be non-negative, got {}",
            listing.monthly_rent
        )));
    }
    if listing.bedrooms < 1 {
        return Err(Error::InvalidInput(format!(
            "bedrooms must be at least 1, got {}",
            listing.bedrooms
        )));
    }
    let available_from = clean_text(listing.available_from.as_deref());
    if let Some(day) = &available_from {
        chrono::NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map_err(|_| Error::InvalidInput(format!("available_from is not YYYY-MM-DD: {}", day)))?;
    }

    require_active_user(pool, &listing.owner_id).await?;

    let guid = new_guid();
    sqlx::query(
        "INSERT INTO housing_listings
             (guid, owner_id, title, location, monthly_rent, bedrooms, available_from, status)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(&listing.owner_id)
    .bind(&title)
    .bind(clean_text(listing.location.as_deref()))
    .bind(listing.monthly_rent)
    .bind(listing.bedrooms)
    .bind(available_from)
    .bind(AVAILABLE)
    .execute(pool)
    .await?;

    let row = sqlx::query(&format!(
        "SELECT {} FROM housing_listings WHERE guid = ?",
        LISTING_COLUMNS
    ))
    .bind(&guid)
    .fetch_one(pool)
    .await?;

    Ok(listing_from_row(&row))
}

pub async fn list_listings(pool: &SqlitePool, requested_page: i64) -> Result<Page<HousingListing>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM housing_listings")
        .fetch_one(pool)
        .await?;

    let pagination = calculate_pagination(total, requested_page);

    let rows = sqlx::query(&format!(
        "SELECT {} FROM housing_listings ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
        LISTING_COLUMNS
    ))
    .bind(PAGE_SIZE)
    .bind(pagination.offset)
    .fetch_all(pool)
    .await?;

    Ok(Page::new(rows.iter().map(listing_from_row).collect(), total, pagination))
}

/// Available listings not owned by `seeker_id`, from active owners
pub async fn list_available_for(pool: &SqlitePool, seeker_id: &str) -> Result<Vec<HousingListing>> {
    let rows = sqlx::query(
        "SELECT h.guid, h.owner_id, h.title, h.location, h.monthly_rent, h.bedrooms,
                h.available_from, h.status, h.created_at
         FROM housing_listings h
         JOIN users u ON u.guid = h.owner_id
         WHERE h.status = ? AND h.owner_id != ? AND u.deleted_at IS NULL
         ORDER BY h.created_at, h.rowid",
    )
    .bind(AVAILABLE)
    .bind(seeker_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(listing_from_row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_test_db;
    use crate::db::users::{create_user, NewUser};
    use ucep_common::db::UserRole;

    async fn owner(pool: &SqlitePool, email: &str) -> String {
        create_user(
            pool,
            &NewUser {
                email: email.to_string(),
                display_name: "Owner".to_string(),
                role: UserRole::Student,
            },
        )
        .await
        .unwrap()
        .guid
    }

    fn listing(owner_id: &str) -> NewListing {
        NewListing {
            owner_id: owner_id.to_string(),
            title: "Room near campus".to_string(),
            location: Some("Cambridge".to_string()),
            monthly_rent: 900.0,
            bedrooms: 2,
            available_from: Some("2026-09-01".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (pool, _dir) = setup_test_db().await;
        let a = owner(&pool, "a@uni.edu").await;
        let b = owner(&pool, "b@uni.edu").await;

        let created = create_listing(&pool, &listing(&a)).await.unwrap();
        assert_eq!(created.status, AVAILABLE);

        let page = list_listings(&pool, 1).await.unwrap();
        assert_eq!(page.total, 1);

        assert!(list_available_for(&pool, &a).await.unwrap().is_empty());
        assert_eq!(list_available_for(&pool, &b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_validation() {
        let (pool, _dir) = setup_test_db().await;
        let a = owner(&pool, "a@uni.edu").await;

        let mut bad = listing(&a);
        bad.monthly_rent = -1.0;
        assert!(matches!(create_listing(&pool, &bad).await, Err(Error::InvalidInput(_))));

        let mut bad = listing(&a);
        bad.available_from = Some("September".to_string());
        assert!(matches!(create_listing(&pool, &bad).await, Err(Error::InvalidInput(_))));
    }
}
