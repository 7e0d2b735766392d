//! StudyStore - persistence for learning sessions
//!
//! SQLite-backed storage for the entities behind an AI-guided learning
//! conversation: sessions and their message transcripts, roadmaps with
//! ordered goals, learning materials, quizzes with bounded attempts, and
//! graduation projects with evaluated submissions.
//!
//! Multi-entity writes (a roadmap and its goals, a quiz and its questions)
//! are transactional: either the full entity graph is committed or none of
//! it is.

pub mod domain;
mod error;
mod store;

pub use domain::{
    Goal, GraduationProject, GraduationQuestion, GraduationSubmission, Material, Message, MessageRole, NewGoal,
    NewGraduationQuestion, NewMaterial, NewQuizQuestion, Quiz, QuizAttempt, QuizQuestion, Roadmap, RoadmapStatus,
    Session, SessionStatus, SkillLevel,
};
pub use error::StoreError;
pub use store::{SessionSnapshot, StudyStore};

/// Current time as unix milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
