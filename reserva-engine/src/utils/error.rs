//! Unified error handling
//!
//! One typed taxonomy for everything the engine can reject or fail on.
//!
//! # Propagation policy
//!
//! | Class | Behavior |
//! |-------|----------|
//! | Malformed input (`InvalidTimeFormat`, `InvalidDateExpression`, `InvalidPartySize`, `Validation`) | rejected synchronously, never retried |
//! | Conflict (`TableUnavailable`, `NoAvailability`) | normal business outcome, returned immediately so the caller can offer alternatives |
//! | Transient (`RepositoryUnavailable`, `Timeout`) | propagated on interactive paths; the sweeper logs and retries next tick |

use crate::db::repository::RepoError;

/// Engine error enumeration
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    // ========== Malformed input ==========
    #[error("Invalid time format: '{0}' (expected H:MM or HH:MM, 00:00-23:59)")]
    InvalidTimeFormat(String),

    #[error("Invalid date expression: '{0}'")]
    InvalidDateExpression(String),

    #[error("Invalid party size: {0} (must be at least 1)")]
    InvalidPartySize(i32),

    #[error("Validation failed: {0}")]
    Validation(String),

    // ========== Business conflicts ==========
    #[error("Table {table_id} unavailable: {detail}")]
    TableUnavailable { table_id: String, detail: String },

    #[error("No tables available{}", format_alternatives(.alternatives))]
    NoAvailability {
        /// Closest canonical turn start times, "HH:MM"
        alternatives: Vec<String>,
        /// Human-readable suggestion combining the alternatives
        suggestion: Option<String>,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // ========== System ==========
    #[error("Repository unavailable: {0}")]
    RepositoryUnavailable(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),
}

fn format_alternatives(alternatives: &[String]) -> String {
    if alternatives.is_empty() {
        String::new()
    } else {
        format!("; closest turns: {}", alternatives.join(", "))
    }
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn table_unavailable(table_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::TableUnavailable {
            table_id: table_id.into(),
            detail: detail.into(),
        }
    }

    /// Transient failures a periodic caller may retry on its next tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::RepositoryUnavailable(_) | EngineError::Timeout(_)
        )
    }
}

impl From<RepoError> for EngineError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => EngineError::NotFound(msg),
            RepoError::Duplicate(msg) => EngineError::Validation(msg),
            RepoError::Validation(msg) => EngineError::Validation(msg),
            RepoError::Unavailable(msg) => EngineError::RepositoryUnavailable(msg),
            RepoError::Database(msg) => EngineError::Repository(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_availability_message_lists_turns() {
        let err = EngineError::NoAvailability {
            alternatives: vec!["13:00".into(), "14:30".into()],
            suggestion: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("13:00"));
        assert!(msg.contains("14:30"));
    }

    #[test]
    fn repo_unavailable_is_transient() {
        let err: EngineError = RepoError::Unavailable("store offline".into()).into();
        assert!(err.is_transient());
        assert!(!EngineError::InvalidPartySize(0).is_transient());
    }
}
