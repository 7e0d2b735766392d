//! Roadmap and Goal domain types
//!
//! A Roadmap is the learning plan generated for a session (at most one per
//! session). Goals are its ordered children, numbered 1..N within the
//! roadmap; `goal_number` is unique per roadmap and defines presentation
//! order.

use serde::{Deserialize, Serialize};

/// Roadmap lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoadmapStatus {
    /// Skeleton exists but has no usable goal set yet
    #[default]
    Draft,
    /// Learner is working through goals
    InProgress,
    /// All goals and the graduation project are done
    Completed,
    Archived,
}

impl RoadmapStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for RoadmapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target skill level for a goal or material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    /// Derive a skill level from a goal priority (1 = highest priority).
    ///
    /// High-priority goals sit later in the dependency chain and demand
    /// more of the learner.
    pub fn from_priority(priority: u8) -> Self {
        match priority {
            0..=2 => Self::Advanced,
            3 => Self::Intermediate,
            _ => Self::Beginner,
        }
    }
}

impl std::fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The learning plan for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roadmap {
    pub id: i64,
    pub session_id: i64,

    /// The user request the roadmap was generated from
    pub user_request: String,

    pub total_estimated_weeks: u32,

    /// Capstone project description and title
    pub graduation_project: String,
    pub graduation_project_title: String,

    pub status: RoadmapStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// An ordered learning goal within a roadmap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub roadmap_id: i64,

    /// Position within the roadmap; unique per roadmap
    pub goal_number: u32,

    pub title: String,
    pub description: String,

    /// 1-5, lower number = higher priority
    pub priority: u8,

    pub skill_level: SkillLevel,
    pub estimated_hours: u32,
    pub actual_hours: u32,

    /// 0-100; non-decreasing under normal operation
    pub completion_percentage: u8,

    pub created_at: i64,
}

/// Goal fields supplied when creating a roadmap skeleton
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoal {
    pub goal_number: u32,
    pub title: String,
    pub description: String,
    pub priority: u8,
    pub skill_level: SkillLevel,
    pub estimated_hours: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_level_from_priority() {
        assert_eq!(SkillLevel::from_priority(1), SkillLevel::Advanced);
        assert_eq!(SkillLevel::from_priority(2), SkillLevel::Advanced);
        assert_eq!(SkillLevel::from_priority(3), SkillLevel::Intermediate);
        assert_eq!(SkillLevel::from_priority(4), SkillLevel::Beginner);
        assert_eq!(SkillLevel::from_priority(5), SkillLevel::Beginner);
    }

    #[test]
    fn test_roadmap_status_round_trip() {
        for status in [
            RoadmapStatus::Draft,
            RoadmapStatus::InProgress,
            RoadmapStatus::Completed,
            RoadmapStatus::Archived,
        ] {
            assert_eq!(RoadmapStatus::parse(status.as_str()), Some(status));
        }
    }
}
