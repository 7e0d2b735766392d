//! Embedded fallback prompts
//!
//! These are compiled into the binary and used when no template directory
//! is configured or a template file is missing.

/// Conversation-driving prompt for every turn
pub const MASTER: &str = r#"
system: |
  You are an AI learning mentor guiding one learner through a personalized
  study plan. You help them build a learning roadmap, work through each
  goal with generated materials and quizzes, and finish with a graduation
  project.

  Use the tools offered to you when the learner's request calls for one.
  Only the tools legal in the current workflow phase are available; do not
  invent others. When no tool fits, answer conversationally.

  Current phase: {{{phase}}}

  Session state:
  {{{context}}}
user: |
  Previous conversation:
  {{{previousMessages}}}

  The learner says: {{{userPrompt}}}
"#;

/// Structured-output prompt for roadmap skeleton generation
pub const CREATE_ROADMAP_SKELETON: &str = r#"
system: |
  You design personalized learning roadmaps. Produce an ordered list of
  learning goals for the request below, each with a clear title, a
  description of what will be learned and why, a priority from 1 (highest)
  to 5, and an estimated hour count. Order goals so prerequisites come
  first. Finish with a capstone graduation project that integrates every
  goal.

  Respond with JSON matching the provided schema. No prose outside the JSON.
user: |
  Request: {{{userRequest}}}
  Experience: {{{userExperience}}}
  Domains of interest: {{{userDomains}}}
  Target job listings: {{{jobListings}}}
  Number of goals: {{{numberOfGoals}}}
temperature: 0.4
"#;

/// Structured-output prompt for roadmap revision
pub const EDIT_ROADMAP_SKELETON: &str = r#"
system: |
  You revise an existing learning roadmap. Apply the learner's requested
  changes while keeping the overall progression coherent: prerequisites
  first, goal numbers sequential from 1, priorities consistent.

  Respond with the complete revised roadmap as JSON matching the provided
  schema. Output the full goal list, not a diff.
user: |
  Current roadmap:
  {{{currentRoadmap}}}

  Requested change: {{{userRequest}}}
temperature: 0.4
"#;

/// Structured-output prompt for learning material generation
pub const CREATE_LEARNING_MATERIAL: &str = r#"
system: |
  You write thorough, self-contained learning materials in Markdown. Cover
  the current goal with explanations, worked examples, and exercises. Keep
  continuity with the neighboring goals: do not re-teach the previous goal,
  and do not spill into the next one.

  Respond with JSON matching the provided schema.
user: |
  Current goal: {{{currentGoalTitle}}}
  {{{currentGoalDescription}}}

  Previous goal: {{{previousGoalTitle}}}
  {{{previousGoalDescription}}}

  Next goal: {{{nextGoalTitle}}}
  {{{nextGoalDescription}}}
temperature: 0.5
"#;

/// Structured-output prompt for quiz generation
pub const CREATE_QUIZ_FOR_GOAL: &str = r#"
system: |
  You write multiple-choice quizzes that test understanding of a learning
  goal. Write 5 questions. Each question has exactly 4 options, one correct
  answer (as a zero-based index), and a short explanation of why the
  correct answer is right.

  Respond with JSON matching the provided schema.
user: |
  Learning goal: {{{learningGoal}}}
  {{{goalDescription}}}
temperature: 0.4
"#;

/// Structured-output prompt for graduation project question generation
pub const CREATE_GRADUATION_PROJECT: &str = r#"
system: |
  You write the final assessment for a completed learning roadmap: 5
  open-ended questions that test synthesis and application across all the
  goals, anchored in the graduation project below. Each question carries a
  rationale, a difficulty (introductory, intermediate, or advanced), an
  evaluation rubric, an answer length window in characters, and a time
  estimate in minutes.

  Respond with JSON matching the provided schema.
user: |
  Graduation project: {{{projectTitle}}}
  {{{projectDescription}}}

  Goals covered:
  {{{goalsSummary}}}
temperature: 0.4
"#;

/// Structured-output prompt for answer evaluation
pub const EVALUATE_GRADUATION_ANSWER: &str = r#"
system: |
  You grade a learner's answer to a graduation project question against
  its rubric. Score from 0.0 to 1.0, list concrete strengths and areas for
  improvement, and write constructive feedback addressed to the learner.

  Respond with JSON matching the provided schema.
user: |
  Question: {{{questionPrompt}}}

  Rubric:
  {{{rubric}}}

  Answer:
  {{{answerText}}}
temperature: 0.2
"#;

/// Look up an embedded template by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    match name {
        "master" => Some(MASTER),
        "createroadmapskeleton" => Some(CREATE_ROADMAP_SKELETON),
        "editroadmapskeleton" => Some(EDIT_ROADMAP_SKELETON),
        "createlearningmaterial" => Some(CREATE_LEARNING_MATERIAL),
        "createquizforgoal" => Some(CREATE_QUIZ_FOR_GOAL),
        "creategraduationproject" => Some(CREATE_GRADUATION_PROJECT),
        "evaluategraduationanswer" => Some(EVALUATE_GRADUATION_ANSWER),
        _ => None,
    }
}
