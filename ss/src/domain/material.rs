//! Learning material domain type

use serde::{Deserialize, Serialize};

use super::SkillLevel;

/// Generated learning content attached to a goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: i64,
    pub goal_id: i64,
    pub title: String,

    /// article, video, tutorial, lesson, ...
    pub material_type: String,

    pub description: String,

    /// Markdown body
    pub content: String,

    pub estimated_minutes: u32,
    pub difficulty: SkillLevel,
    pub is_completed: bool,

    /// 1-5 stars, set by the learner
    pub user_rating: Option<u8>,

    pub created_at: i64,
}

/// Material fields supplied at creation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMaterial {
    pub goal_id: i64,
    pub title: String,
    pub material_type: String,
    pub description: String,
    pub content: String,
    pub estimated_minutes: u32,
    pub difficulty: SkillLevel,
}
