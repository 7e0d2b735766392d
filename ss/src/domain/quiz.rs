//! Quiz domain types
//!
//! A Quiz belongs to a goal and carries ordered questions. Learners take
//! attempts, bounded by `max_attempts` and scored against
//! `passing_score_percentage`.

use serde::{Deserialize, Serialize};

/// A quiz generated for a goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub goal_id: i64,
    pub title: String,
    pub description: String,
    pub time_limit_minutes: u32,
    pub passing_score_percentage: f64,
    pub max_attempts: u32,
    pub created_at: i64,
}

/// One question within a quiz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: i64,
    pub quiz_id: i64,

    /// Presentation order within the quiz
    pub position: u32,

    pub question: String,
    pub options: Vec<String>,

    /// Index into `options`
    pub correct_answer: u32,

    pub explanation: String,
    pub points: u32,
}

/// Question fields supplied when creating a quiz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: u32,
    pub explanation: String,
    pub points: u32,
}

/// One recorded attempt at a quiz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub quiz_id: i64,

    /// 1-based, assigned in submission order
    pub attempt_number: u32,

    pub score_percentage: f64,
    pub passed: bool,
    pub started_at: i64,
    pub completed_at: Option<i64>,
}
