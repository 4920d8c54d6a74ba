//! Database models

use crate::matching::{Candidate, JobTarget, RoommateProfile};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Employer,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Employer => "employer",
            UserRole::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(UserRole::Student),
            "employer" => Ok(UserRole::Employer),
            "admin" => Ok(UserRole::Admin),
            other => Err(Error::InvalidInput(format!("Unknown role: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Open,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Closed => "closed",
        }
    }
}

impl FromStr for JobStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(JobStatus::Open),
            "closed" => Ok(JobStatus::Closed),
            other => Err(Error::InvalidInput(format!("Unknown job status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Submitted,
    Shortlisted,
    Rejected,
    Offered,
    Hired,
    Withdrawn,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Counts as a positive outcome in fairness reporting
    pub fn is_selected(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Shortlisted | ApplicationStatus::Offered | ApplicationStatus::Hired
        )
    }

    /// Statuses stored in SQL for "selected" outcomes
    pub const SELECTED: [&'static str; 3] = ["shortlisted", "offered", "hired"];
}

impl FromStr for ApplicationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(ApplicationStatus::Submitted),
            "shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "offered" => Ok(ApplicationStatus::Offered),
            "hired" => Ok(ApplicationStatus::Hired),
            "withdrawn" => Ok(ApplicationStatus::Withdrawn),
            other => Err(Error::InvalidInput(format!("Unknown application status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub guid: String,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub created_at: String,
    pub deleted_at: Option<String>,
    pub anonymized_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentProfile {
    pub user_id: String,
    pub major: Option<String>,
    pub gpa: Option<f64>,
    pub years_experience: Option<f64>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub demographic_group: Option<String>,
}

impl StudentProfile {
    pub fn to_candidate(&self) -> Candidate {
        Candidate {
            skills: self.skills.clone(),
            major: self.major.clone(),
            years_experience: self.years_experience,
            location: self.location.clone(),
            gpa: self.gpa,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub guid: String,
    pub employer_id: String,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub remote: bool,
    pub required_skills: Vec<String>,
    pub preferred_majors: Vec<String>,
    pub min_experience_years: Option<f64>,
    pub min_gpa: Option<f64>,
    pub status: JobStatus,
    pub created_at: String,
}

impl Job {
    pub fn to_target(&self) -> JobTarget {
        JobTarget {
            required_skills: self.required_skills.clone(),
            preferred_majors: self.preferred_majors.clone(),
            min_experience_years: self.min_experience_years,
            location: self.location.clone(),
            remote: self.remote,
            min_gpa: self.min_gpa,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobApplication {
    pub guid: String,
    pub job_id: String,
    pub user_id: String,
    pub status: ApplicationStatus,
    /// Match score captured when the application was submitted
    pub match_score: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Stored roommate profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoommateProfileRecord {
    pub user_id: String,
    #[serde(flatten)]
    pub profile: RoommateProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HousingListing {
    pub guid: String,
    pub owner_id: String,
    pub title: String,
    pub location: Option<String>,
    pub monthly_rent: f64,
    pub bedrooms: i64,
    pub available_from: Option<String>,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scholarship {
    pub guid: String,
    pub title: String,
    pub sponsor: Option<String>,
    pub amount_cents: i64,
    pub min_gpa: Option<f64>,
    pub eligible_majors: Vec<String>,
    /// `YYYY-MM-DD`
    pub deadline: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub guid: String,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub starts_at: String,
    pub capacity: Option<i64>,
    pub created_by: String,
    pub rsvp_count: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub guid: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeAward {
    pub badge_id: String,
    pub badge_name: String,
    pub user_id: String,
    pub awarded_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub actor_id: Option<String>,
    pub action: String,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAnalytics {
    /// `YYYY-MM-DD`
    pub day: String,
    pub new_users: i64,
    pub jobs_posted: i64,
    pub applications: i64,
    pub event_rsvps: i64,
}
