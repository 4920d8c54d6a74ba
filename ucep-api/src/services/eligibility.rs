//! Scholarship eligibility

use crate::db;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use ucep_common::db::{Scholarship, StudentProfile};
use ucep_common::matching::normalize;
use ucep_common::Result;

/// True when the profile meets the GPA floor and major list
///
/// A missing GPA fails any GPA floor; a missing major fails any major list.
pub fn is_eligible(profile: &StudentProfile, scholarship: &Scholarship) -> bool {
    let gpa_ok = match scholarship.min_gpa {
        Some(min) => profile.gpa.is_some_and(|gpa| gpa >= min),
        None => true,
    };

    let major_ok = scholarship.eligible_majors.is_empty()
        || profile.major.as_deref().is_some_and(|major| {
            let major = normalize(major);
            scholarship
                .eligible_majors
                .iter()
                .any(|eligible| normalize(eligible) == major)
        });

    gpa_ok && major_ok
}

/// Open scholarships the student currently qualifies for
pub async fn eligible_scholarships(
    pool: &SqlitePool,
    user_id: &str,
    today: NaiveDate,
) -> Result<Vec<Scholarship>> {
    let profile = db::users::load_candidate_profile(pool, user_id).await?;

    Ok(db::scholarships::list_open_scholarships(pool, today)
        .await?
        .into_iter()
        .filter(|s| is_eligible(&profile, s))
        .collect())
}
