//! Domain entities stored by StudyStore

mod graduation;
mod material;
mod message;
mod quiz;
mod roadmap;
mod session;

pub use graduation::{GraduationProject, GraduationQuestion, GraduationSubmission, NewGraduationQuestion};
pub use material::{Material, NewMaterial};
pub use message::{Message, MessageRole};
pub use quiz::{NewQuizQuestion, Quiz, QuizAttempt, QuizQuestion};
pub use roadmap::{Goal, NewGoal, Roadmap, RoadmapStatus, SkillLevel};
pub use session::{Session, SessionStatus};
