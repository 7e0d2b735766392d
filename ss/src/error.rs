//! Store error types

use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Quiz {quiz_id} has no attempts left (max {max_attempts})")]
    AttemptsExhausted { quiz_id: i64, max_attempts: u32 },

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the caller may retry the operation
    ///
    /// Busy (lock contention) and constraint failures are the transient
    /// classes; everything else is deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Busy(_) | StoreError::Constraint(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, ref message) = err {
            match code.code {
                rusqlite::ErrorCode::ConstraintViolation => {
                    return StoreError::Constraint(message.clone().unwrap_or_else(|| code.to_string()));
                }
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
                    return StoreError::Busy(message.clone().unwrap_or_else(|| code.to_string()));
                }
                _ => {}
            }
        }
        StoreError::Sqlite(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(StoreError::Busy("locked".to_string()).is_retryable());
        assert!(StoreError::Constraint("unique".to_string()).is_retryable());
        assert!(
            !StoreError::NotFound {
                entity: "goal",
                id: 7
            }
            .is_retryable()
        );
        assert!(
            !StoreError::AttemptsExhausted {
                quiz_id: 1,
                max_attempts: 3
            }
            .is_retryable()
        );
    }
}
