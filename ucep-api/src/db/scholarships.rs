//! Scholarships

use super::{clean_list, clean_text, decode_list, encode_list, new_guid, require_text};
use crate::pagination::{calculate_pagination, Page, PAGE_SIZE};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use ucep_common::db::Scholarship;
use ucep_common::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct NewScholarship {
    pub title: String,
    pub sponsor: Option<String>,
    #[serde(default)]
    pub amount_cents: i64,
    pub min_gpa: Option<f64>,
    #[serde(default)]
    pub eligible_majors: Vec<String>,
    /// `YYYY-MM-DD`
    pub deadline: Option<String>,
}

const SCHOLARSHIP_COLUMNS: &str =
    "guid, title, sponsor, amount_cents, min_gpa, eligible_majors, deadline, created_at";

fn scholarship_from_row(row: &SqliteRow) -> Result<Scholarship> {
    Ok(Scholarship {
        guid: row.get("guid"),
        title: row.get("title"),
        sponsor: row.get("sponsor"),
        amount_cents: row.get("amount_cents"),
        min_gpa: row.get("min_gpa"),
        eligible_majors: decode_list(row.get("eligible_majors"))?,
        deadline: row.get("deadline"),
        created_at: row.get("created_at"),
    })
}

pub async fn create_scholarship(pool: &SqlitePool, input: &NewScholarship) -> Result<Scholarship> {
    let title = require_text(&input.title, "title")?;

    if input.amount_cents < 0 {
        return Err(Error::InvalidInput("amount_cents must be non-negative".to_string()));
    }
    if let Some(gpa) = input.min_gpa {
        if !(0.0..=4.0).contains(&gpa) {
            return Err(Error::InvalidInput(format!("min_gpa must be within 0.0-4.0, got {}", gpa)));
        }
    }
    let deadline = clean_text(input.deadline.as_deref());
    if let Some(day) = &deadline {
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map_err(|_| Error::InvalidInput(format!("deadline is not YYYY-MM-DD: {}", day)))?;
    }

    let guid = new_guid();
    sqlx::query(
        "INSERT INTO scholarships (guid, title, sponsor, amount_cents, min_gpa, eligible_majors, deadline)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(&title)
    .bind(clean_text(input.sponsor.as_deref()))
    .bind(input.amount_cents)
    .bind(input.min_gpa)
    .bind(encode_list(&clean_list(&input.eligible_majors))?)
    .bind(deadline)
    .execute(pool)
    .await?;

    let row = sqlx::query(&format!(
        "SELECT {} FROM scholarships WHERE guid = ?",
        SCHOLARSHIP_COLUMNS
    ))
    .bind(&guid)
    .fetch_one(pool)
    .await?;

    scholarship_from_row(&row)
}

pub async fn list_scholarships(pool: &SqlitePool, requested_page: i64) -> Result<Page<Scholarship>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scholarships")
        .fetch_one(pool)
        .await?;

    let pagination = calculate_pagination(total, requested_page);

    let rows = sqlx::query(&format!(
        "SELECT {} FROM scholarships ORDER BY deadline IS NULL, deadline, rowid LIMIT ? OFFSET ?",
        SCHOLARSHIP_COLUMNS
    ))
    .bind(PAGE_SIZE)
    .bind(pagination.offset)
    .fetch_all(pool)
    .await?;

    let items = rows.iter().map(scholarship_from_row).collect::<Result<Vec<_>>>()?;
    Ok(Page::new(items, total, pagination))
}

/// Scholarships whose deadline is `today` or later (or open-ended)
pub async fn list_open_scholarships(pool: &SqlitePool, today: NaiveDate) -> Result<Vec<Scholarship>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM scholarships
         WHERE deadline IS NULL OR deadline >= ?
         ORDER BY deadline IS NULL, deadline, rowid",
        SCHOLARSHIP_COLUMNS
    ))
    .bind(today.format("%Y-%m-%d").to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(scholarship_from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_test_db;

    fn scholarship(title: &str, deadline: Option<&str>) -> NewScholarship {
        NewScholarship {
            title: title.to_string(),
            sponsor: None,
            amount_cents: 100_000,
            min_gpa: Some(3.0),
            eligible_majors: vec!["Biology".to_string()],
            deadline: deadline.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_open_scholarships_exclude_past_deadlines() {
        let (pool, _dir) = setup_test_db().await;
        create_scholarship(&pool, &scholarship("Past", Some("2020-01-01"))).await.unwrap();
        create_scholarship(&pool, &scholarship("Today", Some("2026-03-01"))).await.unwrap();
        create_scholarship(&pool, &scholarship("Rolling", None)).await.unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let open = list_open_scholarships(&pool, today).await.unwrap();
        let titles: Vec<&str> = open.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Today", "Rolling"]);

        assert_eq!(list_scholarships(&pool, 1).await.unwrap().total, 3);
    }

    #[tokio::test]
    async fn test_bad_deadline_rejected() {
        let (pool, _dir) = setup_test_db().await;
        let result = create_scholarship(&pool, &scholarship("Bad", Some("03/01/2026"))).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
