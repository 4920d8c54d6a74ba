//! Service helpers combining database access with scoring

pub mod eligibility;
pub mod matching;
