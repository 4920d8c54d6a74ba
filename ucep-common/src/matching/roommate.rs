//! Roommate compatibility scoring
//!
//! Weights (points): lifestyle 25, schedule 20, cleanliness 20, social 15,
//! budget 20. The score is symmetric: `score(a, b) == score(b, a)`.

use super::MatchScore;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoommateWeights {
    pub lifestyle: f64,
    pub schedule: f64,
    pub cleanliness: f64,
    pub social: f64,
    pub budget: f64,
}

pub const ROOMMATE_WEIGHTS: RoommateWeights = RoommateWeights {
    lifestyle: 25.0,
    schedule: 20.0,
    cleanliness: 20.0,
    social: 15.0,
    budget: 20.0,
};

/// Partial credit when exactly one side has a flexible schedule
pub const FLEXIBLE_SCHEDULE_CREDIT: f64 = 0.75;

/// Levels run 1..=5
const LEVEL_SPAN: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepSchedule {
    EarlyBird,
    NightOwl,
    Flexible,
}

impl SleepSchedule {
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepSchedule::EarlyBird => "early_bird",
            SleepSchedule::NightOwl => "night_owl",
            SleepSchedule::Flexible => "flexible",
        }
    }
}

impl FromStr for SleepSchedule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "early_bird" => Ok(SleepSchedule::EarlyBird),
            "night_owl" => Ok(SleepSchedule::NightOwl),
            "flexible" => Ok(SleepSchedule::Flexible),
            other => Err(format!("Unknown sleep schedule: {}", other)),
        }
    }
}

/// Roommate preferences and habits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoommateProfile {
    pub sleep_schedule: Option<SleepSchedule>,
    /// 1 (relaxed) to 5 (spotless)
    pub cleanliness: Option<i64>,
    /// 1 (quiet) to 5 (very social)
    pub social_level: Option<i64>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub smoker: Option<bool>,
    pub accepts_smoker: Option<bool>,
    pub has_pets: Option<bool>,
    pub accepts_pets: Option<bool>,
}

/// Score compatibility between two roommate profiles
pub fn score_roommate_compatibility(a: &RoommateProfile, b: &RoommateProfile) -> MatchScore {
    let w = ROOMMATE_WEIGHTS;
    MatchScore::from_components(&[
        ("lifestyle", lifestyle_score(a, b), w.lifestyle),
        ("schedule", schedule_score(a.sleep_schedule, b.sleep_schedule), w.schedule),
        ("cleanliness", level_score(a.cleanliness, b.cleanliness), w.cleanliness),
        ("social", level_score(a.social_level, b.social_level), w.social),
        ("budget", budget_score(a, b), w.budget),
    ])
}

/// A habit check passes when neither side brings what the other refuses
fn habit_ok(
    a_has: Option<bool>,
    a_accepts: Option<bool>,
    b_has: Option<bool>,
    b_accepts: Option<bool>,
) -> bool {
    match (a_has, a_accepts, b_has, b_accepts) {
        (Some(a_has), Some(a_accepts), Some(b_has), Some(b_accepts)) => {
            (!a_has || b_accepts) && (!b_has || a_accepts)
        }
        _ => false,
    }
}

pub fn lifestyle_score(a: &RoommateProfile, b: &RoommateProfile) -> f64 {
    let smoking = habit_ok(a.smoker, a.accepts_smoker, b.smoker, b.accepts_smoker);
    let pets = habit_ok(a.has_pets, a.accepts_pets, b.has_pets, b.accepts_pets);

    [smoking, pets].iter().filter(|ok| **ok).count() as f64 / 2.0
}

pub fn schedule_score(a: Option<SleepSchedule>, b: Option<SleepSchedule>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) if a == b => 1.0,
        (Some(SleepSchedule::Flexible), Some(_)) | (Some(_), Some(SleepSchedule::Flexible)) => {
            FLEXIBLE_SCHEDULE_CREDIT
        }
        _ => 0.0,
    }
}

/// `1 - |a - b| / 4` for 1..=5 levels
pub fn level_score(a: Option<i64>, b: Option<i64>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => {
            let (a, b) = (a.clamp(1, 5), b.clamp(1, 5));
            1.0 - (a - b).abs() as f64 / LEVEL_SPAN
        }
        _ => 0.0,
    }
}

fn budget_range(profile: &RoommateProfile) -> Option<(f64, f64)> {
    let (min, max) = match (profile.budget_min, profile.budget_max) {
        (Some(min), Some(max)) => (min, max),
        (Some(only), None) | (None, Some(only)) => (only, only),
        (None, None) => return None,
    };

    if !min.is_finite() || !max.is_finite() {
        return None;
    }

    Some((min.min(max), min.max(max)))
}

/// Overlap of the two budget ranges relative to the narrower one
pub fn budget_score(a: &RoommateProfile, b: &RoommateProfile) -> f64 {
    let (Some((a_min, a_max)), Some((b_min, b_max))) = (budget_range(a), budget_range(b)) else {
        return 0.0;
    };

    let overlap = a_max.min(b_max) - a_min.max(b_min);
    if overlap < 0.0 {
        return 0.0;
    }

    let narrower = (a_max - a_min).min(b_max - b_min);
    if narrower <= 0.0 {
        // A single-point budget inside (or touching) the other range
        return 1.0;
    }

    (overlap / narrower).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> RoommateProfile {
        RoommateProfile {
            sleep_schedule: Some(SleepSchedule::EarlyBird),
            cleanliness: Some(4),
            social_level: Some(2),
            budget_min: Some(600.0),
            budget_max: Some(900.0),
            smoker: Some(false),
            accepts_smoker: Some(false),
            has_pets: Some(false),
            accepts_pets: Some(true),
        }
    }

    #[test]
    fn test_identical_profiles_score_100() {
        let result = score_roommate_compatibility(&profile(), &profile());
        assert!((result.score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_profiles_score_0() {
        let empty = RoommateProfile::default();
        assert_eq!(score_roommate_compatibility(&empty, &profile()).score, 0.0);
    }

    #[test]
    fn test_opposite_profiles() {
        let mut a = profile();
        a.accepts_pets = Some(false);
        let b = RoommateProfile {
            sleep_schedule: Some(SleepSchedule::NightOwl),
            cleanliness: Some(0), // clamped to 1 -> |4 - 1| = 3
            social_level: Some(5), // |2 - 5| = 3
            budget_min: Some(1500.0),
            budget_max: Some(2000.0),
            smoker: Some(true),
            accepts_smoker: Some(true),
            has_pets: Some(true),
            accepts_pets: Some(true),
        };
        let result = score_roommate_compatibility(&a, &b);
        assert_eq!(result.points("lifestyle"), 0.0);
        assert_eq!(result.points("schedule"), 0.0);
        assert_eq!(result.points("budget"), 0.0);
        assert!((result.points("cleanliness") - 5.0).abs() < 1e-9);
        assert!((result.points("social") - 3.75).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric() {
        let a = profile();
        let mut b = profile();
        b.sleep_schedule = Some(SleepSchedule::Flexible);
        b.cleanliness = Some(2);
        b.budget_min = Some(800.0);
        b.budget_max = Some(1200.0);
        b.has_pets = Some(true);

        let ab = score_roommate_compatibility(&a, &b);
        let ba = score_roommate_compatibility(&b, &a);
        assert!((ab.score - ba.score).abs() < 1e-9);
    }

    #[test]
    fn test_pet_owner_with_pet_averse_roommate() {
        let mut a = profile();
        a.has_pets = Some(true);
        let mut b = profile();
        b.accepts_pets = Some(false);
        // smoking passes, pets fail
        assert!((lifestyle_score(&a, &b) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_flexible_schedule_partial_credit() {
        assert_eq!(
            schedule_score(Some(SleepSchedule::Flexible), Some(SleepSchedule::NightOwl)),
            FLEXIBLE_SCHEDULE_CREDIT
        );
        assert_eq!(schedule_score(None, Some(SleepSchedule::NightOwl)), 0.0);
    }

    #[test]
    fn test_budget_overlap() {
        let mut a = profile(); // 600..900
        let mut b = profile();
        b.budget_min = Some(750.0);
        b.budget_max = Some(1050.0);
        // overlap 150 over narrower 300
        assert!((budget_score(&a, &b) - 0.5).abs() < 1e-9);

        // Point budget inside the range
        b.budget_min = Some(700.0);
        b.budget_max = None;
        assert_eq!(budget_score(&a, &b), 1.0);

        a.budget_min = None;
        a.budget_max = None;
        assert_eq!(budget_score(&a, &b), 0.0);
    }

    #[test]
    fn test_sleep_schedule_parse() {
        assert_eq!("Night_Owl".parse::<SleepSchedule>().unwrap(), SleepSchedule::NightOwl);
        assert!("owl".parse::<SleepSchedule>().is_err());
        assert_eq!(SleepSchedule::EarlyBird.as_str(), "early_bird");
    }
}
