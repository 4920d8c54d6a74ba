//! Job postings

use super::{clean_list, clean_text, decode_list, encode_list, new_guid, require_text};
use super::users::require_active_user;
use crate::pagination::{calculate_pagination, Page, PAGE_SIZE};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use ucep_common::db::{Job, JobStatus, UserRole};
use ucep_common::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct NewJob {
    pub employer_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: Option<String>,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_majors: Vec<String>,
    pub min_experience_years: Option<f64>,
    pub min_gpa: Option<f64>,
}

const JOB_COLUMNS: &str = "guid, employer_id, title, description, location, remote, \
     required_skills, preferred_majors, min_experience_years, min_gpa, status, created_at";

fn job_from_row(row: &SqliteRow) -> Result<Job> {
    let status: String = row.get("status");
    Ok(Job {
        guid: row.get("guid"),
        employer_id: row.get("employer_id"),
        title: row.get("title"),
        description: row.get("description"),
        location: row.get("location"),
        remote: row.get::<i64, _>("remote") != 0,
        required_skills: decode_list(row.get("required_skills"))?,
        preferred_majors: decode_list(row.get("preferred_majors"))?,
        min_experience_years: row.get("min_experience_years"),
        min_gpa: row.get("min_gpa"),
        status: status.parse()?,
        created_at: row.get("created_at"),
    })
}

pub async fn create_job(pool: &SqlitePool, new_job: &NewJob) -> Result<Job> {
    let title = require_text(&new_job.title, "title")?;

    if let Some(gpa) = new_job.min_gpa {
        if !(0.0..=4.0).contains(&gpa) {
            return Err(Error::InvalidInput(format!("min_gpa must be within 0.0-4.0, got {}", gpa)));
        }
    }
    if let Some(years) = new_job.min_experience_years {
        if !years.is_finite() || years < 0.0 {
            return Err(Error::InvalidInput(format!(
                "min_experience_years must be non-negative, got {}",
                years
            )));
        }
    }

    let employer = require_active_user(pool, &new_job.employer_id).await?;
    if employer.role == UserRole::Student {
        return Err(Error::InvalidInput(format!(
            "User {} is a student and cannot post jobs",
            employer.guid
        )));
    }

    let guid = new_guid();
    sqlx::query(
        r#"
        INSERT INTO jobs
            (guid, employer_id, title, description, location, remote,
             required_skills, preferred_majors, min_experience_years, min_gpa)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(&employer.guid)
    .bind(&title)
    .bind(new_job.description.trim())
    .bind(clean_text(new_job.location.as_deref()))
    .bind(new_job.remote)
    .bind(encode_list(&clean_list(&new_job.required_skills))?)
    .bind(encode_list(&clean_list(&new_job.preferred_majors))?)
    .bind(new_job.min_experience_years)
    .bind(new_job.min_gpa)
    .execute(pool)
    .await?;

    require_job(pool, &guid).await
}

pub async fn get_job(pool: &SqlitePool, guid: &str) -> Result<Option<Job>> {
    let row = sqlx::query(&format!("SELECT {} FROM jobs WHERE guid = ?", JOB_COLUMNS))
        .bind(guid)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(job_from_row).transpose()
}

pub async fn require_job(pool: &SqlitePool, guid: &str) -> Result<Job> {
    get_job(pool, guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Job {}", guid)))
}

/// Existing posting by the same employer with the same (trimmed) title
pub async fn find_job_by_title(
    pool: &SqlitePool,
    employer_id: &str,
    title: &str,
) -> Result<Option<Job>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM jobs WHERE employer_id = ? AND title = ? ORDER BY rowid LIMIT 1",
        JOB_COLUMNS
    ))
    .bind(employer_id)
    .bind(title.trim())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(job_from_row).transpose()
}

/// Paged job listing, newest first, optionally filtered by status
pub async fn list_jobs(
    pool: &SqlitePool,
    status: Option<JobStatus>,
    requested_page: i64,
) -> Result<Page<Job>> {
    let status = status.map(|s| s.as_str());

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await?;

    let pagination = calculate_pagination(total, requested_page);

    let rows = sqlx::query(&format!(
        "SELECT {} FROM jobs WHERE (? IS NULL OR status = ?)
         ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
        JOB_COLUMNS
    ))
    .bind(status)
    .bind(status)
    .bind(PAGE_SIZE)
    .bind(pagination.offset)
    .fetch_all(pool)
    .await?;

    let jobs = rows.iter().map(job_from_row).collect::<Result<Vec<_>>>()?;
    Ok(Page::new(jobs, total, pagination))
}

/// All open jobs in creation order
pub async fn list_open_jobs(pool: &SqlitePool) -> Result<Vec<Job>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM jobs WHERE status = 'open' ORDER BY created_at, rowid",
        JOB_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(job_from_row).collect()
}

pub async fn set_job_status(pool: &SqlitePool, guid: &str, status: JobStatus) -> Result<Job> {
    let affected = sqlx::query(
        "UPDATE jobs SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(status.as_str())
    .bind(guid)
    .execute(pool)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(Error::NotFound(format!("Job {}", guid)));
    }

    require_job(pool, guid).await
}

/// Hard delete; applications cascade
pub async fn delete_job(pool: &SqlitePool, guid: &str) -> Result<()> {
    let affected = sqlx::query("DELETE FROM jobs WHERE guid = ?")
        .bind(guid)
        .execute(pool)
        .await?
        .rows_affected();

    if affected == 0 {
        return Err(Error::NotFound(format!("Job {}", guid)));
    }
    Ok(())
}
