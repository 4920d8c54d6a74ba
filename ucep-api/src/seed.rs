//! Bulk loading of users, student profiles and jobs from TOML
//!
//! Seeding is repeatable: users are matched by email and reused, jobs are
//! skipped when the employer already has a posting with the same title.
//! Profiles listed in the file are always written, so a second run updates
//! them in place.
//!
//! ```toml
//! [[users]]
//! email = "hr@acme.example"
//! display_name = "Acme Recruiting"
//! role = "employer"
//!
//! [[users]]
//! email = "ada@campus.example"
//! display_name = "Ada"
//! [users.profile]
//! major = "Computer Science"
//! gpa = 3.8
//! skills = ["rust", "sql"]
//!
//! [[jobs]]
//! employer_email = "hr@acme.example"
//! title = "Backend Intern"
//! required_skills = ["rust"]
//! ```

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{debug, info};
use ucep_common::db::UserRole;
use ucep_common::{Error, Result};

use crate::db;
use crate::db::jobs::NewJob;
use crate::db::users::{NewUser, StudentProfileInput};

#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub jobs: Vec<SeedJob>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub email: String,
    pub display_name: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
    pub profile: Option<StudentProfileInput>,
}

fn default_role() -> UserRole {
    UserRole::Student
}

#[derive(Debug, Deserialize)]
pub struct SeedJob {
    pub employer_email: String,
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

/// What one seed run changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub users_created: u64,
    pub users_reused: u64,
    pub profiles_written: u64,
    pub jobs_created: u64,
    pub jobs_skipped: u64,
}

impl SeedFile {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid seed file: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Apply a seed file to the database
///
/// Jobs naming an employer email that is neither in the database nor in the
/// file fail with `InvalidInput`; earlier rows stay written.
pub async fn apply_seed(pool: &SqlitePool, seed: &SeedFile) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for entry in &seed.users {
        let user = match db::users::find_user_by_email(pool, &entry.email).await? {
            Some(existing) => {
                debug!("User {} already exists, reusing {}", entry.email, existing.guid);
                report.users_reused += 1;
                existing
            }
            None => {
                let new_user = NewUser {
                    email: entry.email.clone(),
                    display_name: entry.display_name.clone(),
                    role: entry.role,
                };
                report.users_created += 1;
                db::users::create_user(pool, &new_user).await?
            }
        };

        if let Some(profile) = &entry.profile {
            db::users::upsert_student_profile(pool, &user.guid, profile).await?;
            report.profiles_written += 1;
        }
    }

    for entry in &seed.jobs {
        let employer = db::users::find_user_by_email(pool, &entry.employer_email)
            .await?
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Job '{}' names unknown employer {}",
                    entry.title, entry.employer_email
                ))
            })?;

        if db::jobs::find_job_by_title(pool, &employer.guid, &entry.title)
            .await?
            .is_some()
        {
            debug!("Job '{}' already posted by {}, skipping", entry.title, entry.employer_email);
            report.jobs_skipped += 1;
            continue;
        }

        let new_job = NewJob {
            employer_id: employer.guid,
            title: entry.title.clone(),
            description: entry.description.clone(),
            location: entry.location.clone(),
            remote: entry.remote,
            required_skills: entry.required_skills.clone(),
            preferred_majors: entry.preferred_majors.clone(),
            min_experience_years: entry.min_experience_years,
            min_gpa: entry.min_gpa,
        };
        db::jobs::create_job(pool, &new_job).await?;
        report.jobs_created += 1;
    }

    info!(
        users_created = report.users_created,
        users_reused = report.users_reused,
        jobs_created = report.jobs_created,
        jobs_skipped = report.jobs_skipped,
        "Seed complete"
    );
    Ok(report)
}
