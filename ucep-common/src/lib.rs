//! # UCEP Common Library
//!
//! Shared code for the UCEP service and its operational tooling:
//! - Database schema, migrations and row models
//! - Request authentication primitives
//! - Configuration loading
//! - Match, compatibility and fairness scoring

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod matching;

pub use error::{Error, Result};
