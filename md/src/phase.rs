//! Phase resolution
//!
//! Computes, from a session's persisted state, the current workflow phase
//! and the set of tools the model may be offered this turn. Tools outside
//! the eligible set are never sent to the model, so illegal calls are
//! prevented by construction; the dispatcher re-checks as a second line of
//! defense.
//!
//! Resolution is a pure function of [`SessionSnapshot`]: no IO, no model
//! calls, no hidden state.

use serde::{Deserialize, Serialize};
use studystore::{RoadmapStatus, SessionSnapshot};
use tracing::warn;

/// Coarse workflow stage gating tool eligibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No usable roadmap yet: build or revise the skeleton
    Roadmap,
    /// Roadmap underway: generate materials and quizzes per goal
    Learning,
    /// Everything complete: capstone assessment
    Graduation,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Roadmap => write!(f, "roadmap"),
            Phase::Learning => write!(f, "learning"),
            Phase::Graduation => write!(f, "graduation"),
        }
    }
}

/// Identifier for every tool the orchestrator can execute
///
/// Dispatch is keyed on this enum, not on raw strings; the wire name only
/// appears at the model boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    CreateRoadmapSkeleton,
    EditRoadmapSkeleton,
    CreateLearningMaterial,
    CreateQuizForGoal,
    CreateGraduationProject,
    EvaluateGraduationAnswer,
}

impl ToolId {
    /// All known tools
    pub const ALL: [ToolId; 6] = [
        ToolId::CreateRoadmapSkeleton,
        ToolId::EditRoadmapSkeleton,
        ToolId::CreateLearningMaterial,
        ToolId::CreateQuizForGoal,
        ToolId::CreateGraduationProject,
        ToolId::EvaluateGraduationAnswer,
    ];

    /// Wire name offered to the model
    pub fn name(&self) -> &'static str {
        match self {
            ToolId::CreateRoadmapSkeleton => "createRoadmapSkeleton",
            ToolId::EditRoadmapSkeleton => "editRoadmapSkeleton",
            ToolId::CreateLearningMaterial => "createLearningMaterial",
            ToolId::CreateQuizForGoal => "createQuizForGoal",
            ToolId::CreateGraduationProject => "createGraduationProject",
            ToolId::EvaluateGraduationAnswer => "evaluateGraduationAnswer",
        }
    }

    /// Parse a wire name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.name() == name)
    }
}

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Result of phase resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseDecision {
    pub phase: Phase,
    pub eligible: Vec<ToolId>,

    /// Set when state did not match any clean rule and the resolver fell
    /// back to the Roadmap phase; logged, never surfaced as an error
    pub ambiguous: bool,
}

impl PhaseDecision {
    /// Whether a tool may be invoked this turn
    pub fn is_eligible(&self, tool: ToolId) -> bool {
        self.eligible.contains(&tool)
    }
}

/// Compute the current phase and eligible tool set for a session
///
/// When state is ambiguous (a roadmap with zero goals, an archived
/// roadmap), resolution falls back to the Roadmap phase rather than
/// guessing forward.
pub fn resolve(snapshot: &SessionSnapshot) -> PhaseDecision {
    let decision = match snapshot.roadmap_status {
        // No roadmap yet: only skeleton creation is on the table
        None => PhaseDecision {
            phase: Phase::Roadmap,
            eligible: vec![ToolId::CreateRoadmapSkeleton],
            ambiguous: false,
        },
        // Draft skeleton: create a fresh one or revise what exists
        Some(RoadmapStatus::Draft) => PhaseDecision {
            phase: Phase::Roadmap,
            eligible: vec![ToolId::CreateRoadmapSkeleton, ToolId::EditRoadmapSkeleton],
            ambiguous: false,
        },
        Some(RoadmapStatus::Archived) => PhaseDecision {
            phase: Phase::Roadmap,
            eligible: vec![ToolId::CreateRoadmapSkeleton],
            ambiguous: true,
        },
        Some(RoadmapStatus::InProgress) if snapshot.goal_count == 0 => PhaseDecision {
            phase: Phase::Roadmap,
            eligible: vec![ToolId::CreateRoadmapSkeleton, ToolId::EditRoadmapSkeleton],
            ambiguous: true,
        },
        Some(RoadmapStatus::InProgress) if all_goals_complete(snapshot) => graduation_decision(),
        Some(RoadmapStatus::InProgress) => PhaseDecision {
            phase: Phase::Learning,
            eligible: vec![ToolId::CreateLearningMaterial, ToolId::CreateQuizForGoal],
            ambiguous: false,
        },
        Some(RoadmapStatus::Completed) => graduation_decision(),
    };

    if decision.ambiguous {
        warn!(
            session_id = snapshot.session_id,
            goal_count = snapshot.goal_count,
            status = ?snapshot.roadmap_status,
            "phase resolution ambiguous, falling back to roadmap phase"
        );
    }

    decision
}

fn all_goals_complete(snapshot: &SessionSnapshot) -> bool {
    snapshot.goal_count > 0
        && snapshot.goals_with_complete_materials == snapshot.goal_count
        && snapshot.goals_with_passed_quiz == snapshot.goal_count
}

fn graduation_decision() -> PhaseDecision {
    PhaseDecision {
        phase: Phase::Graduation,
        eligible: vec![ToolId::CreateGraduationProject, ToolId::EvaluateGraduationAnswer],
        ambiguous: false,
    }
}
