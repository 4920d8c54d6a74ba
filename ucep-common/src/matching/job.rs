//! Job/candidate match scoring
//!
//! Weights (points): skills 30, major 25, experience 15, location 10, GPA 20.
//!
//! Sub-scores:
//! - skills: fraction of required skills covered by some candidate skill
//!   (case-insensitive; a candidate skill covers a requirement when it equals
//!   or contains it, so "Python 3" covers "python")
//! - major: candidate major loosely matches any preferred major
//! - experience: `years / min_years`, capped at 1
//! - location: remote jobs always match, otherwise loose text match
//! - GPA: full credit at or above the minimum, then linear decay to zero
//!   [`GPA_PARTIAL_BAND`] points below it
//!
//! A candidate field that is missing contributes nothing. A job that places
//! no constraint on a dimension gives full credit to any candidate with a
//! known value there.

use super::{contains_normalized, loosely_matches, normalize, present, MatchScore};
use serde::{Deserialize, Serialize};

/// Width of the partial-credit band below a GPA minimum
pub const GPA_PARTIAL_BAND: f64 = 0.5;

/// Dimension weights in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JobWeights {
    pub skills: f64,
    pub major: f64,
    pub experience: f64,
    pub location: f64,
    pub gpa: f64,
}

pub const JOB_WEIGHTS: JobWeights = JobWeights {
    skills: 30.0,
    major: 25.0,
    experience: 15.0,
    location: 10.0,
    gpa: 20.0,
};

/// Candidate attributes as loaded from a student profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub skills: Vec<String>,
    pub major: Option<String>,
    pub years_experience: Option<f64>,
    pub location: Option<String>,
    pub gpa: Option<f64>,
}

/// Job posting requirements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobTarget {
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_majors: Vec<String>,
    pub min_experience_years: Option<f64>,
    pub location: Option<String>,
    #[serde(default)]
    pub remote: bool,
    pub min_gpa: Option<f64>,
}

/// Score a candidate against a job posting
pub fn score_job_match(candidate: &Candidate, job: &JobTarget) -> MatchScore {
    let w = JOB_WEIGHTS;
    MatchScore::from_components(&[
        ("skills", skills_score(&candidate.skills, &job.required_skills), w.skills),
        ("major", major_score(candidate.major.as_deref(), &job.preferred_majors), w.major),
        (
            "experience",
            experience_score(candidate.years_experience, job.min_experience_years),
            w.experience,
        ),
        (
            "location",
            location_score(candidate.location.as_deref(), job.location.as_deref(), job.remote),
            w.location,
        ),
        ("gpa", gpa_score(candidate.gpa, job.min_gpa), w.gpa),
    ])
}

fn non_empty(items: &[String]) -> Vec<&str> {
    items
        .iter()
        .map(String::as_str)
        .filter(|s| !s.trim().is_empty())
        .collect()
}

pub fn skills_score(candidate_skills: &[String], required: &[String]) -> f64 {
    let have = non_empty(candidate_skills);
    if have.is_empty() {
        return 0.0;
    }

    let mut required: Vec<String> = non_empty(required).into_iter().map(normalize).collect();
    required.sort();
    required.dedup();

    if required.is_empty() {
        return 1.0;
    }

    let covered = required
        .iter()
        .filter(|req| have.iter().any(|skill| contains_normalized(skill, req)))
        .count();

    covered as f64 / required.len() as f64
}

pub fn major_score(major: Option<&str>, preferred: &[String]) -> f64 {
    let Some(major) = present(major) else {
        return 0.0;
    };

    let preferred = non_empty(preferred);
    if preferred.is_empty() || preferred.iter().any(|p| loosely_matches(major, p)) {
        1.0
    } else {
        0.0
    }
}

pub fn experience_score(years: Option<f64>, min_years: Option<f64>) -> f64 {
    let Some(years) = years.filter(|y| y.is_finite()) else {
        return 0.0;
    };

    match min_years.filter(|m| m.is_finite() && *m > 0.0) {
        Some(min) => (years.max(0.0) / min).min(1.0),
        None => 1.0,
    }
}

pub fn location_score(location: Option<&str>, job_location: Option<&str>, remote: bool) -> f64 {
    if remote {
        return 1.0;
    }

    let Some(location) = present(location) else {
        return 0.0;
    };

    match present(job_location) {
        Some(job_location) if loosely_matches(location, job_location) => 1.0,
        Some(_) => 0.0,
        None => 1.0,
    }
}

pub fn gpa_score(gpa: Option<f64>, min_gpa: Option<f64>) -> f64 {
    let Some(gpa) = gpa.filter(|g| g.is_finite()) else {
        return 0.0;
    };

    match min_gpa.filter(|m| m.is_finite()) {
        Some(min) if gpa >= min => 1.0,
        Some(min) => (1.0 - (min - gpa) / GPA_PARTIAL_BAND).max(0.0),
        None => 1.0,
    }
}
