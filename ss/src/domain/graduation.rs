//! Graduation project domain types
//!
//! One graduation project per roadmap: the generated capstone assessment.
//! Questions carry an inclusive answer-length window and an evaluation
//! rubric; submissions record the learner's answer plus the AI-produced
//! evaluation.

use serde::{Deserialize, Serialize};

/// Capstone assessment for a completed roadmap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraduationProject {
    pub id: i64,
    pub roadmap_id: i64,
    pub title: String,
    pub description: String,

    /// generated | submitted | evaluated
    pub status: String,

    pub created_at: i64,
}

/// One open-ended assessment question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraduationQuestion {
    pub id: i64,
    pub project_id: i64,
    pub position: u32,
    pub prompt: String,

    /// Why this question is being asked
    pub rationale: String,

    /// introductory | intermediate | advanced
    pub difficulty: String,

    pub evaluation_rubric: Vec<String>,

    /// Inclusive answer length window, in characters
    pub answer_min_chars: u32,
    pub answer_max_chars: u32,

    pub estimated_minutes: u32,
}

/// Question fields supplied when the project is generated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGraduationQuestion {
    pub prompt: String,
    pub rationale: String,
    pub difficulty: String,
    pub evaluation_rubric: Vec<String>,
    pub answer_min_chars: u32,
    pub answer_max_chars: u32,
    pub estimated_minutes: u32,
}

/// A learner's answer to one question plus its evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraduationSubmission {
    pub id: i64,
    pub question_id: i64,
    pub answer_text: String,

    /// 0.0-1.0, produced by the evaluation call
    pub score: Option<f64>,

    pub feedback: Option<String>,

    /// Set when evaluation failed instead of producing a score
    pub error: Option<String>,

    pub created_at: i64,
}
