//! Users, student profiles and roommate profiles

use super::{clean_list, clean_text, decode_list, encode_list, new_guid, require_text};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use ucep_common::db::{RoommateProfileRecord, StudentProfile, User, UserRole};
use ucep_common::matching::{RoommateProfile, SleepSchedule};
use ucep_common::{Error, Result};

/// Registration request
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::Student
}

const USER_COLUMNS: &str =
    "guid, email, display_name, role, created_at, deleted_at, anonymized_at";

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let role: String = row.get("role");
    Ok(User {
        guid: row.get("guid"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        role: role.parse()?,
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
        anonymized_at: row.get("anonymized_at"),
    })
}

/// Lowercased, trimmed email with a minimal shape check
fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(Error::InvalidInput(format!("Invalid email address: {}", email))),
    }
}

pub async fn create_user(pool: &SqlitePool, new_user: &NewUser) -> Result<User> {
    let email = normalize_email(&new_user.email)?;
    let display_name = require_text(&new_user.display_name, "display_name")?;
    let guid = new_guid();

    sqlx::query("INSERT INTO users (guid, email, display_name, role) VALUES (?, ?, ?, ?)")
        .bind(&guid)
        .bind(&email)
        .bind(&display_name)
        .bind(new_user.role.as_str())
        .execute(pool)
        .await?;

    require_user(pool, &guid).await
}

pub async fn get_user(pool: &SqlitePool, guid: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE guid = ?", USER_COLUMNS))
        .bind(guid)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Load a user, soft-deleted ones included
pub async fn require_user(pool: &SqlitePool, guid: &str) -> Result<User> {
    get_user(pool, guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {}", guid)))
}

/// Load a user who has not been deleted
pub async fn require_active_user(pool: &SqlitePool, guid: &str) -> Result<User> {
    let user = require_user(pool, guid).await?;
    if user.deleted_at.is_some() {
        return Err(Error::NotFound(format!("User {}", guid)));
    }
    Ok(user)
}

/// Mark a user deleted; returns false when the user was already deleted
pub async fn soft_delete_user(pool: &SqlitePool, guid: &str) -> Result<bool> {
    require_user(pool, guid).await?;

    let affected = sqlx::query(
        "UPDATE users SET deleted_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
         WHERE guid = ? AND deleted_at IS NULL",
    )
    .bind(guid)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected > 0)
}

/// Anonymize users soft-deleted before `cutoff` (SQLite datetime text)
///
/// Returns the GUIDs that were anonymized.
pub async fn anonymize_deleted_users(pool: &SqlitePool, cutoff: &str) -> Result<Vec<String>> {
    let mut tx = pool.begin().await?;

    let guids: Vec<String> = sqlx::query_scalar(
        "SELECT guid FROM users
         WHERE deleted_at IS NOT NULL AND deleted_at < ? AND anonymized_at IS NULL",
    )
    .bind(cutoff)
    .fetch_all(&mut *tx)
    .await?;

    for guid in &guids {
        sqlx::query(
            "UPDATE users
             SET email = 'deleted-' || guid || '@invalid',
                 display_name = 'Deleted User',
                 anonymized_at = CURRENT_TIMESTAMP,
                 updated_at = CURRENT_TIMESTAMP
             WHERE guid = ?",
        )
        .bind(guid)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM student_profiles WHERE user_id = ?")
            .bind(guid)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM roommate_profiles WHERE user_id = ?")
            .bind(guid)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(guids)
}

// ============================================================================
// Student profiles
// ============================================================================

/// Profile update body (`user_id` comes from the path)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentProfileInput {
    pub major: Option<String>,
    pub gpa: Option<f64>,
    pub years_experience: Option<f64>,
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub demographic_group: Option<String>,
}

impl StudentProfileInput {
    fn validate(&self) -> Result<()> {
        if let Some(gpa) = self.gpa {
            if !(0.0..=4.0).contains(&gpa) {
                return Err(Error::InvalidInput(format!("GPA must be within 0.0-4.0, got {}", gpa)));
            }
        }
        if let Some(years) = self.years_experience {
            if !years.is_finite() || years < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "years_experience must be non-negative, got {}",
                    years
                )));
            }
        }
        Ok(())
    }
}

pub async fn upsert_student_profile(
    pool: &SqlitePool,
    user_id: &str,
    input: &StudentProfileInput,
) -> Result<StudentProfile> {
    input.validate()?;
    require_active_user(pool, user_id).await?;

    sqlx::query(
        r#"
        INSERT INTO student_profiles
            (user_id, major, gpa, years_experience, location, skills, demographic_group)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            major = excluded.major,
            gpa = excluded.gpa,
            years_experience = excluded.years_experience,
            location = excluded.location,
            skills = excluded.skills,
            demographic_group = excluded.demographic_group,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(user_id)
    .bind(clean_text(input.major.as_deref()))
    .bind(input.gpa)
    .bind(input.years_experience)
    .bind(clean_text(input.location.as_deref()))
    .bind(encode_list(&clean_list(&input.skills))?)
    .bind(clean_text(input.demographic_group.as_deref()))
    .execute(pool)
    .await?;

    get_student_profile(pool, user_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Profile for {} vanished after upsert", user_id)))
}

fn student_profile_from_row(row: &SqliteRow) -> Result<StudentProfile> {
    Ok(StudentProfile {
        user_id: row.get("user_id"),
        major: row.get("major"),
        gpa: row.get("gpa"),
        years_experience: row.get("years_experience"),
        location: row.get("location"),
        skills: decode_list(row.get("skills"))?,
        demographic_group: row.get("demographic_group"),
    })
}

pub async fn get_student_profile(pool: &SqlitePool, user_id: &str) -> Result<Option<StudentProfile>> {
    let row = sqlx::query(
        "SELECT user_id, major, gpa, years_experience, location, skills, demographic_group
         FROM student_profiles WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(student_profile_from_row).transpose()
}

/// Profile of an active user; users without a profile get an empty one
pub async fn load_candidate_profile(pool: &SqlitePool, user_id: &str) -> Result<StudentProfile> {
    require_active_user(pool, user_id).await?;
    Ok(get_student_profile(pool, user_id)
        .await?
        .unwrap_or_else(|| StudentProfile {
            user_id: user_id.to_string(),
            ..Default::default()
        }))
}

// ============================================================================
// Roommate profiles
// ============================================================================

fn bool_column(row: &SqliteRow, column: &str) -> Option<bool> {
    row.get::<Option<i64>, _>(column).map(|v| v != 0)
}

fn roommate_from_row(row: &SqliteRow) -> Result<RoommateProfileRecord> {
    let sleep_schedule = row
        .get::<Option<String>, _>("sleep_schedule")
        .map(|s| s.parse::<SleepSchedule>().map_err(Error::Internal))
        .transpose()?;

    Ok(RoommateProfileRecord {
        user_id: row.get("user_id"),
        profile: RoommateProfile {
            sleep_schedule,
            cleanliness: row.get("cleanliness"),
            social_level: row.get("social_level"),
            budget_min: row.get("budget_min"),
            budget_max: row.get("budget_max"),
            smoker: bool_column(row, "smoker"),
            accepts_smoker: bool_column(row, "accepts_smoker"),
            has_pets: bool_column(row, "has_pets"),
            accepts_pets: bool_column(row, "accepts_pets"),
        },
    })
}

const ROOMMATE_COLUMNS: &str = "r.user_id, r.sleep_schedule, r.cleanliness, r.social_level, \
     r.budget_min, r.budget_max, r.smoker, r.accepts_smoker, r.has_pets, r.accepts_pets";

fn validate_roommate_profile(profile: &RoommateProfile) -> Result<()> {
    for (name, level) in [("cleanliness", profile.cleanliness), ("social_level", profile.social_level)] {
        if let Some(level) = level {
            if !(1..=5).contains(&level) {
                return Err(Error::InvalidInput(format!("{} must be 1-5, got {}", name, level)));
            }
        }
    }
    if let (Some(min), Some(max)) = (profile.budget_min, profile.budget_max) {
        if min > max {
            return Err(Error::InvalidInput(format!(
                "budget_min ({}) exceeds budget_max ({})",
                min, max
            )));
        }
    }
    Ok(())
}

pub async fn upsert_roommate_profile(
    pool: &SqlitePool,
    user_id: &str,
    profile: &RoommateProfile,
) -> Result<RoommateProfileRecord> {
    validate_roommate_profile(profile)?;
    require_active_user(pool, user_id).await?;

    sqlx::query(
        r#"
        INSERT INTO roommate_profiles
            (user_id, sleep_schedule, cleanliness, social_level, budget_min, budget_max,
             smoker, accepts_smoker, has_pets, accepts_pets)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            sleep_schedule = excluded.sleep_schedule,
            cleanliness = excluded.cleanliness,
            social_level = excluded.social_level,
            budget_min = excluded.budget_min,
            budget_max = excluded.budget_max,
            smoker = excluded.smoker,
            accepts_smoker = excluded.accepts_smoker,
            has_pets = excluded.has_pets,
            accepts_pets = excluded.accepts_pets,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(user_id)
    .bind(profile.sleep_schedule.map(|s| s.as_str()))
    .bind(profile.cleanliness)
    .bind(profile.social_level)
    .bind(profile.budget_min)
    .bind(profile.budget_max)
    .bind(profile.smoker)
    .bind(profile.accepts_smoker)
    .bind(profile.has_pets)
    .bind(profile.accepts_pets)
    .execute(pool)
    .await?;

    require_roommate_profile(pool, user_id).await
}

pub async fn get_roommate_profile(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<RoommateProfileRecord>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM roommate_profiles r WHERE r.user_id = ?",
        ROOMMATE_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(roommate_from_row).transpose()
}

pub async fn require_roommate_profile(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<RoommateProfileRecord> {
    get_roommate_profile(pool, user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Roommate profile for user {}", user_id)))
}

/// Roommate profiles of active users other than `user_id`
pub async fn list_other_roommate_profiles(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<RoommateProfileRecord>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM roommate_profiles r
         JOIN users u ON u.guid = r.user_id
         WHERE r.user_id != ? AND u.deleted_at IS NULL
         ORDER BY u.created_at, r.user_id",
        ROOMMATE_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(roommate_from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_test_db;

    fn student(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            display_name: "Test Student".to_string(),
            role: UserRole::Student,
        }
    }

    #[tokio::test]
    async fn test_create_and_load_user() {
        let (pool, _dir) = setup_test_db().await;

        let user = create_user(&pool, &student("  Alice@Example.EDU ")).await.unwrap();
        assert_eq!(user.email, "alice@example.edu");
        assert_eq!(user.role, UserRole::Student);

        let loaded = require_user(&pool, &user.guid).await.unwrap();
        assert_eq!(loaded.display_name, "Test Student");
        assert!(loaded.deleted_at.is_none());
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let (pool, _dir) = setup_test_db().await;
        let err = create_user(&pool, &student("not-an-email")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_active_lookup() {
        let (pool, _dir) = setup_test_db().await;
        let user = create_user(&pool, &student("bob@example.edu")).await.unwrap();

        assert!(soft_delete_user(&pool, &user.guid).await.unwrap());
        assert!(!soft_delete_user(&pool, &user.guid).await.unwrap());
        assert!(matches!(
            require_active_user(&pool, &user.guid).await,
            Err(Error::NotFound(_))
        ));
        assert!(require_user(&pool, &user.guid).await.unwrap().deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_student_profile_upsert_and_validation() {
        let (pool, _dir) = setup_test_db().await;
        let user = create_user(&pool, &student("carol@example.edu")).await.unwrap();

        let input = StudentProfileInput {
            major: Some(" Computer Science ".to_string()),
            gpa: Some(3.4),
            skills: vec!["Python".to_string(), " ".to_string()],
            ..Default::default()
        };
        let profile = upsert_student_profile(&pool, &user.guid, &input).await.unwrap();
        assert_eq!(profile.major.as_deref(), Some("Computer Science"));
        assert_eq!(profile.skills, vec!["Python"]);

        let bad = StudentProfileInput {
            gpa: Some(4.5),
            ..Default::default()
        };
        assert!(matches!(
            upsert_student_profile(&pool, &user.guid, &bad).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_roommate_profile_round_trip() {
        let (pool, _dir) = setup_test_db().await;
        let user = create_user(&pool, &student("dan@example.edu")).await.unwrap();

        let profile = RoommateProfile {
            sleep_schedule: Some(SleepSchedule::NightOwl),
            cleanliness: Some(3),
            smoker: Some(false),
            ..Default::default()
        };
        let stored = upsert_roommate_profile(&pool, &user.guid, &profile).await.unwrap();
        assert_eq!(stored.profile, profile);

        let bad = RoommateProfile {
            social_level: Some(9),
            ..Default::default()
        };
        assert!(upsert_roommate_profile(&pool, &user.guid, &bad).await.is_err());
    }

    #[tokio::test]
    async fn test_anonymize_deleted_users() {
        let (pool, _dir) = setup_test_db().await;
        let user = create_user(&pool, &student("erin@example.edu")).await.unwrap();
        upsert_student_profile(&pool, &user.guid, &StudentProfileInput::default())
            .await
            .unwrap();

        sqlx::query("UPDATE users SET deleted_at = datetime('now', '-40 days') WHERE guid = ?")
            .bind(&user.guid)
            .execute(&pool)
            .await
            .unwrap();

        let cutoff: String = sqlx::query_scalar("SELECT datetime('now', '-30 days')")
            .fetch_one(&pool)
            .await
            .unwrap();
        let anonymized = anonymize_deleted_users(&pool, &cutoff).await.unwrap();
        assert_eq!(anonymized, vec![user.guid.clone()]);

        let loaded = require_user(&pool, &user.guid).await.unwrap();
        assert_eq!(loaded.email, format!("deleted-{}@invalid", user.guid));
        assert_eq!(loaded.display_name, "Deleted User");
        assert!(loaded.anonymized_at.is_some());
        assert!(get_student_profile(&pool, &user.guid).await.unwrap().is_none());

        // Idempotent
        assert!(anonymize_deleted_users(&pool, &cutoff).await.unwrap().is_empty());
    }
}
