//! Fixed-weight scoring utilities
//!
//! Every scorer here is a plain weighted sum of independently normalized
//! sub-scores. Sub-scores live in `[0, 1]`, weights sum to 100, so totals
//! live in `[0, 100]`. Nothing is learned or tuned at runtime; the functions
//! are pure and deterministic.
//!
//! - [`job`]: candidate vs. job posting
//! - [`roommate`]: roommate profile vs. roommate profile
//! - [`fairness`]: selection-rate parity across applicant groups

pub mod fairness;
pub mod job;
pub mod roommate;

use serde::{Deserialize, Serialize};

pub use fairness::{
    fairness_report, report_from_counts, FairnessReport, GroupOutcome, GroupStats, Outcome,
};
pub use job::{score_job_match, Candidate, JobTarget, JobWeights, JOB_WEIGHTS};
pub use roommate::{
    score_roommate_compatibility, RoommateProfile, RoommateWeights, SleepSchedule,
    ROOMMATE_WEIGHTS,
};

/// One weighted dimension of a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub dimension: String,
    /// Normalized sub-score in `[0, 1]`
    pub raw: f64,
    /// Weight in points (the component's maximum contribution)
    pub weight: f64,
    /// `raw * weight`
    pub points: f64,
}

/// Total score with its per-dimension breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    /// Total in `[0, 100]`
    pub score: f64,
    pub breakdown: Vec<ScoreComponent>,
}

impl MatchScore {
    /// Sum weighted components, clamping to `[0, 100]`
    pub(crate) fn from_components(components: &[(&str, f64, f64)]) -> Self {
        let breakdown: Vec<ScoreComponent> = components
            .iter()
            .map(|&(dimension, raw, weight)| {
                let raw = unit(raw);
                ScoreComponent {
                    dimension: dimension.to_string(),
                    raw,
                    weight,
                    points: raw * weight,
                }
            })
            .collect();

        let total: f64 = breakdown.iter().map(|c| c.points).sum();

        Self {
            score: total.clamp(0.0, 100.0),
            breakdown,
        }
    }

    /// Points contributed by one dimension (0 when absent)
    pub fn points(&self, dimension: &str) -> f64 {
        self.breakdown
            .iter()
            .find(|c| c.dimension == dimension)
            .map(|c| c.points)
            .unwrap_or(0.0)
    }
}

/// Clamp to `[0, 1]`, mapping NaN to 0
pub(crate) fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Lowercase, trim and collapse internal whitespace
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Case-insensitive match where `haystack` equals or contains `needle`
pub(crate) fn contains_normalized(haystack: &str, needle: &str) -> bool {
    let needle = normalize(needle);
    !needle.is_empty() && normalize(haystack).contains(&needle)
}

/// Case-insensitive match in either direction
pub(crate) fn loosely_matches(a: &str, b: &str) -> bool {
    contains_normalized(a, b) || contains_normalized(b, a)
}

/// Non-empty after trimming
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Computer   Science "), "computer science");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_loose_matching() {
        assert!(loosely_matches("Boston, MA", "boston"));
        assert!(loosely_matches("boston", "Boston, MA"));
        assert!(!loosely_matches("Austin", "Boston"));
        assert!(!loosely_matches("", "Boston"));
    }

    #[test]
    fn test_unit_clamps_and_rejects_nan() {
        assert_eq!(unit(1.5), 1.0);
        assert_eq!(unit(-0.2), 0.0);
        assert_eq!(unit(f64::NAN), 0.0);
    }
}
