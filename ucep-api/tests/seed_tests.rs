//! Integration tests for TOML seeding

use sqlx::SqlitePool;
use tempfile::TempDir;
use ucep_api::seed::{apply_seed, SeedFile, SeedReport};
use ucep_common::db::{init_database, UserRole};
use ucep_common::Error;

/// Same layout as the `seed` module documentation
const DOCUMENTED_SEED: &str = r#"
[[users]]
email = "hr@acme.example"
display_name = "Acme Recruiting"
role = "employer"

[[users]]
email = "ada@campus.example"
display_name = "Ada"
[users.profile]
major = "Computer Science"
gpa = 3.8
skills = ["rust", "sql"]

[[jobs]]
employer_email = "hr@acme.example"
title = "Backend Intern"
required_skills = ["rust"]
"#;

async fn setup_test_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("ucep.db")).await.unwrap();
    (pool, dir)
}

async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[test]
fn test_documented_layout_parses() {
    let seed = SeedFile::from_toml_str(DOCUMENTED_SEED).unwrap();
    assert_eq!(seed.users.len(), 2);
    assert_eq!(seed.users[0].role, UserRole::Employer);
    assert_eq!(seed.users[1].role, UserRole::Student);
    assert_eq!(seed.users[1].profile.as_ref().unwrap().gpa, Some(3.8));
    assert_eq!(seed.jobs.len(), 1);
    assert_eq!(seed.jobs[0].required_skills, vec!["rust"]);
}

#[test]
fn test_invalid_toml_is_config_error() {
    assert!(matches!(
        SeedFile::from_toml_str("[[users]]\nemail = 3"),
        Err(Error::Config(_))
    ));
}

#[tokio::test]
async fn test_seed_is_repeatable() {
    let (pool, _dir) = setup_test_db().await;
    let seed = SeedFile::from_toml_str(DOCUMENTED_SEED).unwrap();

    let first = apply_seed(&pool, &seed).await.unwrap();
    assert_eq!(
        first,
        SeedReport {
            users_created: 2,
            users_reused: 0,
            profiles_written: 1,
            jobs_created: 1,
            jobs_skipped: 0,
        }
    );

    let second = apply_seed(&pool, &seed).await.unwrap();
    assert_eq!(
        second,
        SeedReport {
            users_created: 0,
            users_reused: 2,
            profiles_written: 1,
            jobs_created: 0,
            jobs_skipped: 1,
        }
    );

    assert_eq!(count(&pool, "users").await, 2);
    assert_eq!(count(&pool, "student_profiles").await, 1);
    assert_eq!(count(&pool, "jobs").await, 1);
}

#[tokio::test]
async fn test_existing_user_reused_by_email() {
    let (pool, _dir) = setup_test_db().await;
    let first = SeedFile::from_toml_str(
        r#"
[[users]]
email = "HR@Acme.example"
display_name = "Acme"
role = "employer"
"#,
    )
    .unwrap();
    apply_seed(&pool, &first).await.unwrap();

    // Same address in different case, plus a job for it
    let second = SeedFile::from_toml_str(
        r#"
[[users]]
email = "hr@acme.example"
display_name = "Acme Recruiting"
role = "employer"

[[jobs]]
employer_email = "hr@acme.example"
title = "Data Analyst"
"#,
    )
    .unwrap();
    let report = apply_seed(&pool, &second).await.unwrap();
    assert_eq!(report.users_created, 0);
    assert_eq!(report.users_reused, 1);
    assert_eq!(report.jobs_created, 1);
    assert_eq!(count(&pool, "users").await, 1);
}

#[tokio::test]
async fn test_unknown_employer_rejected() {
    let (pool, _dir) = setup_test_db().await;
    let seed = SeedFile::from_toml_str(
        r#"
[[jobs]]
employer_email = "nobody@acme.example"
title = "Ghost Role"
"#,
    )
    .unwrap();

    match apply_seed(&pool, &seed).await {
        Err(Error::InvalidInput(msg)) => assert!(msg.contains("nobody@acme.example")),
        other => panic!("Expected InvalidInput, got {:?}", other),
    }
    assert_eq!(count(&pool, "jobs").await, 0);
}

#[tokio::test]
async fn test_student_cannot_be_seeded_as_employer() {
    let (pool, _dir) = setup_test_db().await;
    let seed = SeedFile::from_toml_str(
        r#"
[[users]]
email = "ada@campus.example"
display_name = "Ada"

[[jobs]]
employer_email = "ada@campus.example"
title = "Tutor"
"#,
    )
    .unwrap();

    assert!(matches!(
        apply_seed(&pool, &seed).await,
        Err(Error::InvalidInput(_))
    ));
}
