//! Session domain type
//!
//! A Session is one user's learning conversation. Sessions are never hard
//! deleted; finished ones are archived.

use serde::{Deserialize, Serialize};

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl SessionStatus {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    /// Parse the storage representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One user's learning conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,

    /// Owning user reference (opaque to this crate)
    pub user_id: String,

    /// Display name
    pub name: String,

    /// Free-text description
    pub description: Option<String>,

    pub status: SessionStatus,

    /// Creation timestamp (unix ms)
    pub created_at: i64,

    /// Last update timestamp (unix ms)
    pub updated_at: i64,

    /// Set when the session transitions to completed
    pub completed_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [SessionStatus::Active, SessionStatus::Completed, SessionStatus::Archived] {
            assert_eq!(SessionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SessionStatus::parse("deleted"), None);
    }
}
