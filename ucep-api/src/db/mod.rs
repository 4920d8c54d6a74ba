//! Database access for ucep-api
//!
//! Plain `sqlx` queries, one module per resource. Functions take the pool
//! (or a transaction) and return `ucep_common::Result`.

pub mod analytics;
pub mod applications;
pub mod audit;
pub mod badges;
pub mod events;
pub mod housing;
pub mod jobs;
pub mod scholarships;
pub mod settings;
pub mod users;

use ucep_common::{Error, Result};

/// Fresh v4 GUID as stored in `guid` columns
pub fn new_guid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Encode a string list for a JSON TEXT column
pub(crate) fn encode_list(items: &[String]) -> Result<String> {
    serde_json::to_string(items).map_err(|e| Error::Internal(format!("Encode list: {}", e)))
}

/// Decode a JSON TEXT column; empty or NULL columns decode as an empty list
pub(crate) fn decode_list(raw: Option<String>) -> Result<Vec<String>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text)
            .map_err(|e| Error::Internal(format!("Corrupt list column: {}", e))),
    }
}

/// Trimmed, non-empty entries only
pub(crate) fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Empty after trimming becomes `None`
pub(crate) fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Reject blank required text
pub(crate) fn require_text(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    /// File-backed database with the full schema; keep the `TempDir` alive
    pub async fn setup_test_db() -> (SqlitePool, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = ucep_common::db::init_database(&dir.path().join("ucep.db"))
            .await
            .unwrap();
        (pool, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_column_round_trip_tolerates_blank() {
        let encoded = encode_list(&["Python".to_string(), "SQL".to_string()]).unwrap();
        assert_eq!(decode_list(Some(encoded)).unwrap(), vec!["Python", "SQL"]);
        assert!(decode_list(None).unwrap().is_empty());
        assert!(decode_list(Some("  ".to_string())).unwrap().is_empty());
        assert!(decode_list(Some("{".to_string())).is_err());
    }

    #[test]
    fn test_clean_helpers() {
        assert_eq!(clean_list(&[" a ".into(), "".into(), "  ".into()]), vec!["a"]);
        assert_eq!(clean_text(Some("  ")), None);
        assert!(require_text(" ", "title").is_err());
    }
}
