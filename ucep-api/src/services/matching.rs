//! Match scoring over stored records
//!
//! Loads profiles and postings, runs the pure scorers from
//! `ucep_common::matching` and ranks the results.

use crate::db;
use serde::Serialize;
use sqlx::SqlitePool;
use std::cmp::Ordering;
use ucep_common::db::{HousingListing, Job, JobApplication};
use ucep_common::matching::{
    fairness_report, score_job_match, score_roommate_compatibility, FairnessReport, MatchScore,
};
use ucep_common::Result;

/// Default and maximum number of ranked results
pub const DEFAULT_MATCH_LIMIT: usize = 20;
pub const MAX_MATCH_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct JobMatch {
    pub job: Job,
    #[serde(flatten)]
    pub result: MatchScore,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateMatch {
    pub application: JobApplication,
    #[serde(flatten)]
    pub result: MatchScore,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoommateMatch {
    pub user_id: String,
    #[serde(flatten)]
    pub result: MatchScore,
}

#[derive(Debug, Clone, Serialize)]
pub struct HousingMatch {
    pub listing: HousingListing,
    #[serde(flatten)]
    pub result: MatchScore,
}

/// Descending by score; `sort_by` is stable so ties keep input order
fn by_score_desc(a: &MatchScore, b: &MatchScore) -> Ordering {
    b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
}

pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_MATCH_LIMIT).clamp(1, MAX_MATCH_LIMIT)
}

/// Score one student against one job
pub async fn job_match(pool: &SqlitePool, user_id: &str, job_id: &str) -> Result<MatchScore> {
    let job = db::jobs::require_job(pool, job_id).await?;
    let profile = db::users::load_candidate_profile(pool, user_id).await?;
    Ok(score_job_match(&profile.to_candidate(), &job.to_target()))
}

/// Open jobs ranked for a student; ties keep job creation order
pub async fn ranked_jobs_for_user(
    pool: &SqlitePool,
    user_id: &str,
    limit: usize,
) -> Result<Vec<JobMatch>> {
    let candidate = db::users::load_candidate_profile(pool, user_id)
        .await?
        .to_candidate();

    let mut matches: Vec<JobMatch> = db::jobs::list_open_jobs(pool)
        .await?
        .into_iter()
        .map(|job| {
            let result = score_job_match(&candidate, &job.to_target());
            JobMatch { job, result }
        })
        .collect();

    matches.sort_by(|a, b| by_score_desc(&a.result, &b.result));
    matches.truncate(limit);
    Ok(matches)
}

/// A job's applicants ranked by their current score
///
/// Scores are recomputed from current profiles; the stored
/// `match_score` on each application keeps the value at submission time.
pub async fn ranked_candidates_for_job(
    pool: &SqlitePool,
    job_id: &str,
) -> Result<Vec<CandidateMatch>> {
    let target = db::jobs::require_job(pool, job_id).await?.to_target();
    let applications = db::applications::list_for_job(pool, job_id).await?;

    let mut matches = Vec::with_capacity(applications.len());
    for application in applications {
        let candidate = db::users::get_student_profile(pool, &application.user_id)
            .await?
            .unwrap_or_default()
            .to_candidate();
        let result = score_job_match(&candidate, &target);
        matches.push(CandidateMatch {
            application,
            result,
        });
    }

    matches.sort_by(|a, b| by_score_desc(&a.result, &b.result));
    Ok(matches)
}

/// Compatibility between two users' roommate profiles
pub async fn roommate_compatibility(
    pool: &SqlitePool,
    user_a: &str,
    user_b: &str,
) -> Result<MatchScore> {
    let a = db::users::require_roommate_profile(pool, user_a).await?;
    let b = db::users::require_roommate_profile(pool, user_b).await?;
    Ok(score_roommate_compatibility(&a.profile, &b.profile))
}

pub async fn ranked_roommates(
    pool: &SqlitePool,
    user_id: &str,
    limit: usize,
) -> Result<Vec<RoommateMatch>> {
    db::users::require_active_user(pool, user_id).await?;
    let seeker = db::users::require_roommate_profile(pool, user_id).await?;

    let mut matches: Vec<RoommateMatch> = db::users::list_other_roommate_profiles(pool, user_id)
        .await?
        .into_iter()
        .map(|other| RoommateMatch {
            result: score_roommate_compatibility(&seeker.profile, &other.profile),
            user_id: other.user_id,
        })
        .collect();

    matches.sort_by(|a, b| by_score_desc(&a.result, &b.result));
    matches.truncate(limit);
    Ok(matches)
}

/// Listings ranked by compatibility with each listing owner
///
/// Listings whose owner has no roommate profile are skipped.
pub async fn ranked_housing(
    pool: &SqlitePool,
    user_id: &str,
    limit: usize,
) -> Result<Vec<HousingMatch>> {
    db::users::require_active_user(pool, user_id).await?;
    let seeker = db::users::require_roommate_profile(pool, user_id).await?;

    let mut matches = Vec::new();
    for listing in db::housing::list_available_for(pool, user_id).await? {
        let Some(owner) = db::users::get_roommate_profile(pool, &listing.owner_id).await? else {
            continue;
        };
        let result = score_roommate_compatibility(&seeker.profile, &owner.profile);
        matches.push(HousingMatch { listing, result });
    }

    matches.sort_by(|a, b| by_score_desc(&a.result, &b.result));
    matches.truncate(limit);
    Ok(matches)
}

/// Selection-rate parity across applicant groups for one job
pub async fn job_fairness(pool: &SqlitePool, job_id: &str) -> Result<FairnessReport> {
    db::jobs::require_job(pool, job_id).await?;
    let outcomes = db::applications::outcomes_for_job(pool, job_id).await?;
    Ok(fairness_report(&outcomes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::jobs::tests::{employer, new_job};
    use crate::db::test_support::setup_test_db;
    use crate::db::users::{create_user, upsert_student_profile, NewUser, StudentProfileInput};
    use ucep_common::db::UserRole;
    use ucep_common::matching::{RoommateProfile, SleepSchedule};

    async fn student(pool: &SqlitePool, email: &str, profile: StudentProfileInput) -> String {
        let user = create_user(
            pool,
            &NewUser {
                email: email.to_string(),
                display_name: "Student".to_string(),
                role: UserRole::Student,
            },
        )
        .await
        .unwrap();
        upsert_student_profile(pool, &user.guid, &profile).await.unwrap();
        user.guid
    }

    fn strong_profile() -> StudentProfileInput {
        StudentProfileInput {
            major: Some("Computer Science".to_string()),
            gpa: Some(3.8),
            years_experience: Some(2.0),
            location: Some("Boston".to_string()),
            skills: vec!["Python".to_string(), "SQL".to_string()],
            demographic_group: None,
        }
    }

    #[tokio::test]
    async fn test_job_match_and_ranking() {
        let (pool, _dir) = setup_test_db().await;
        let employer_id = employer(&pool).await;

        let good = db::jobs::create_job(&pool, &new_job(&employer_id, "Data Intern")).await.unwrap();
        let mut other = new_job(&employer_id, "Welder");
        other.required_skills = vec!["Welding".to_string()];
        other.preferred_majors = vec!["Engineering".to_string()];
        let other = db::jobs::create_job(&pool, &other).await.unwrap();

        let user = student(&pool, "s@uni.edu", strong_profile()).await;

        let score = job_match(&pool, &user, &good.guid).await.unwrap();
        assert!((score.score - 100.0).abs() < 1e-9);

        let ranked = ranked_jobs_for_user(&pool, &user, 10).await.unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].job.guid, good.guid);
        assert_eq!(ranked[1].job.guid, other.guid);
        assert!(ranked[0].result.score >= ranked[1].result.score);

        assert_eq!(ranked_jobs_for_user(&pool, &user, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ties_keep_creation_order() {
        let (pool, _dir) = setup_test_db().await;
        let employer_id = employer(&pool).await;
        let first = db::jobs::create_job(&pool, &new_job(&employer_id, "First")).await.unwrap();
        let second = db::jobs::create_job(&pool, &new_job(&employer_id, "Second")).await.unwrap();
        let user = student(&pool, "t@uni.edu", StudentProfileInput::default()).await;

        let ranked = ranked_jobs_for_user(&pool, &user, 10).await.unwrap();
        assert_eq!(ranked[0].job.guid, first.guid);
        assert_eq!(ranked[1].job.guid, second.guid);
    }

    #[tokio::test]
    async fn test_ranked_roommates_and_housing() {
        let (pool, _dir) = setup_test_db().await;
        let seeker = student(&pool, "seek@uni.edu", StudentProfileInput::default()).await;
        let twin = student(&pool, "twin@uni.edu", StudentProfileInput::default()).await;
        let opposite = student(&pool, "opp@uni.edu", StudentProfileInput::default()).await;
        let no_profile = student(&pool, "none@uni.edu", StudentProfileInput::default()).await;

        let base = RoommateProfile {
            sleep_schedule: Some(SleepSchedule::EarlyBird),
            cleanliness: Some(4),
            social_level: Some(2),
            budget_min: Some(600.0),
            budget_max: Some(900.0),
            smoker: Some(false),
            accepts_smoker: Some(false),
            has_pets: Some(false),
            accepts_pets: Some(false),
        };
        let far = RoommateProfile {
            sleep_schedule: Some(SleepSchedule::NightOwl),
            cleanliness: Some(1),
            ..Default::default()
        };
        db::users::upsert_roommate_profile(&pool, &seeker, &base).await.unwrap();
        db::users::upsert_roommate_profile(&pool, &twin, &base).await.unwrap();
        db::users::upsert_roommate_profile(&pool, &opposite, &far).await.unwrap();

        let ranked = ranked_roommates(&pool, &seeker, 10).await.unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].user_id, twin);
        assert!((ranked[0].result.score - 100.0).abs() < 1e-9);

        let pair = roommate_compatibility(&pool, &twin, &opposite).await.unwrap();
        let reverse = roommate_compatibility(&pool, &opposite, &twin).await.unwrap();
        assert!((pair.score - reverse.score).abs() < 1e-9);

        for owner in [&twin, &no_profile] {
            db::housing::create_listing(
                &pool,
                &db::housing::NewListing {
                    owner_id: owner.to_string(),
                    title: "Room".to_string(),
                    location: None,
                    monthly_rent: 800.0,
                    bedrooms: 1,
                    available_from: None,
                },
            )
            .await
            .unwrap();
        }

        let housing = ranked_housing(&pool, &seeker, 10).await.unwrap();
        assert_eq!(housing.len(), 1);
        assert_eq!(housing[0].listing.owner_id, twin);
    }

    #[tokio::test]
    async fn test_job_fairness_report() {
        let (pool, _dir) = setup_test_db().await;
        let employer_id = employer(&pool).await;
        let job = db::jobs::create_job(&pool, &new_job(&employer_id, "Intern")).await.unwrap();

        let mut index = 0;
        for (group, selected) in [("a", true), ("a", true), ("b", true), ("b", false)] {
            index += 1;
            let profile = StudentProfileInput {
                demographic_group: Some(group.to_string()),
                ..Default::default()
            };
            let user = student(&pool, &format!("f{}@uni.edu", index), profile).await;
            let app = db::applications::create_application(&pool, &job.guid, &user, 0.0)
                .await
                .unwrap();
            if selected {
                db::applications::set_application_status(
                    &pool,
                    &app.guid,
                    ucep_common::db::ApplicationStatus::Offered,
                )
                .await
                .unwrap();
            }
        }

        let report = job_fairness(&pool, &job.guid).await.unwrap();
        assert_eq!(report.total_applicants, 4);
        assert!((report.min_impact_ratio - 0.5).abs() < 1e-9);
        assert!(report.adverse_impact);
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_MATCH_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(10_000)), MAX_MATCH_LIMIT);
    }
}
