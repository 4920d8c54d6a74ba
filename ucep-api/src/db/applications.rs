//! Job applications

use super::new_guid;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use ucep_common::db::{ApplicationStatus, JobApplication};
use ucep_common::matching::Outcome;
use ucep_common::{Error, Result};

const APPLICATION_COLUMNS: &str =
    "guid, job_id, user_id, status, match_score, created_at, updated_at";

fn application_from_row(row: &SqliteRow) -> Result<JobApplication> {
    let status: String = row.get("status");
    Ok(JobApplication {
        guid: row.get("guid"),
        job_id: row.get("job_id"),
        user_id: row.get("user_id"),
        status: status.parse()?,
        match_score: row.get("match_score"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Insert a submitted application carrying the score computed now
///
/// A second application for the same job and user violates
/// `UNIQUE(job_id, user_id)`.
pub async fn create_application(
    pool: &SqlitePool,
    job_id: &str,
    user_id: &str,
    match_score: f64,
) -> Result<JobApplication> {
    let guid = new_guid();

    sqlx::query(
        "INSERT INTO job_applications (guid, job_id, user_id, status, match_score)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(job_id)
    .bind(user_id)
    .bind(ApplicationStatus::Submitted.as_str())
    .bind(match_score)
    .execute(pool)
    .await?;

    require_application(pool, &guid).await
}

pub async fn require_application(pool: &SqlitePool, guid: &str) -> Result<JobApplication> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM job_applications WHERE guid = ?",
        APPLICATION_COLUMNS
    ))
    .bind(guid)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => application_from_row(&row),
        None => Err(Error::NotFound(format!("Application {}", guid))),
    }
}

/// Applications for a job, highest stored score first
pub async fn list_for_job(pool: &SqlitePool, job_id: &str) -> Result<Vec<JobApplication>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM job_applications WHERE job_id = ?
         ORDER BY match_score DESC, created_at, rowid",
        APPLICATION_COLUMNS
    ))
    .bind(job_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(application_from_row).collect()
}

pub async fn set_application_status(
    pool: &SqlitePool,
    guid: &str,
    status: ApplicationStatus,
) -> Result<JobApplication> {
    let affected = sqlx::query(
        "UPDATE job_applications SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(status.as_str())
    .bind(guid)
    .execute(pool)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(Error::NotFound(format!("Application {}", guid)));
    }

    require_application(pool, guid).await
}

/// One outcome per application, labelled with the applicant's group
///
/// Withdrawn applications are left out; they were never decided on.
pub async fn outcomes_for_job(pool: &SqlitePool, job_id: &str) -> Result<Vec<Outcome>> {
    let rows = sqlx::query(
        "SELECT a.status, p.demographic_group
         FROM job_applications a
         LEFT JOIN student_profiles p ON p.user_id = a.user_id
         WHERE a.job_id = ? AND a.status != 'withdrawn'",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let status: ApplicationStatus = row.get::<String, _>("status").parse()?;
            let group: Option<String> = row.get("demographic_group");
            Ok(Outcome::new(group.as_deref(), status.is_selected()))
        })
        .collect()
}
