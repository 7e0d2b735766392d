//! Core StudyStore implementation

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, Row, params};
use tracing::{debug, info};

use crate::domain::{
    Goal, GraduationProject, GraduationQuestion, GraduationSubmission, Material, Message, MessageRole, NewGoal,
    NewGraduationQuestion, NewMaterial, NewQuizQuestion, Quiz, QuizAttempt, QuizQuestion, Roadmap, RoadmapStatus,
    Session, SessionStatus, SkillLevel,
};
use crate::error::StoreError;
use crate::now_ms;

/// Aggregate view of a session's persisted state
///
/// Input to phase resolution: everything needed to decide which tools are
/// legal this turn, computed in one place so the decision itself can stay a
/// pure function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: i64,
    pub roadmap_id: Option<i64>,
    pub roadmap_status: Option<RoadmapStatus>,
    pub goal_count: u32,

    /// Goals with at least one material, all of them completed
    pub goals_with_complete_materials: u32,

    /// Goals with at least one passed quiz attempt
    pub goals_with_passed_quiz: u32,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         TEXT NOT NULL,
    name            TEXT NOT NULL,
    description     TEXT,
    status          TEXT NOT NULL DEFAULT 'active',
    created_at      INTEGER NOT NULL,
    updated_at      INTEGER NOT NULL,
    completed_at    INTEGER
);

CREATE TABLE IF NOT EXISTS messages (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id      INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    role            TEXT NOT NULL,
    content         TEXT NOT NULL,
    metadata        TEXT,
    created_at      INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id);

CREATE TABLE IF NOT EXISTS roadmaps (
    id                          INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id                  INTEGER NOT NULL UNIQUE REFERENCES sessions(id) ON DELETE CASCADE,
    user_request                TEXT NOT NULL,
    total_estimated_weeks       INTEGER NOT NULL,
    graduation_project          TEXT NOT NULL,
    graduation_project_title    TEXT NOT NULL,
    status                      TEXT NOT NULL DEFAULT 'draft',
    created_at                  INTEGER NOT NULL,
    updated_at                  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS goals (
    id                      INTEGER PRIMARY KEY AUTOINCREMENT,
    roadmap_id              INTEGER NOT NULL REFERENCES roadmaps(id) ON DELETE CASCADE,
    goal_number             INTEGER NOT NULL,
    title                   TEXT NOT NULL,
    description             TEXT NOT NULL,
    priority                INTEGER NOT NULL,
    skill_level             TEXT NOT NULL,
    estimated_hours         INTEGER NOT NULL,
    actual_hours            INTEGER NOT NULL DEFAULT 0,
    completion_percentage   INTEGER NOT NULL DEFAULT 0,
    created_at              INTEGER NOT NULL,
    UNIQUE(roadmap_id, goal_number)
);

CREATE TABLE IF NOT EXISTS materials (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    goal_id             INTEGER NOT NULL REFERENCES goals(id) ON DELETE CASCADE,
    title               TEXT NOT NULL,
    material_type       TEXT NOT NULL,
    description         TEXT NOT NULL,
    content             TEXT NOT NULL,
    estimated_minutes   INTEGER NOT NULL,
    difficulty          TEXT NOT NULL,
    is_completed        INTEGER NOT NULL DEFAULT 0,
    user_rating         INTEGER,
    created_at          INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_materials_goal ON materials(goal_id);

CREATE TABLE IF NOT EXISTS quizzes (
    id                          INTEGER PRIMARY KEY AUTOINCREMENT,
    goal_id                     INTEGER NOT NULL REFERENCES goals(id) ON DELETE CASCADE,
    title                       TEXT NOT NULL,
    description                 TEXT NOT NULL,
    time_limit_minutes          INTEGER NOT NULL,
    passing_score_percentage    REAL NOT NULL,
    max_attempts                INTEGER NOT NULL,
    created_at                  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS quiz_questions (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    quiz_id         INTEGER NOT NULL REFERENCES quizzes(id) ON DELETE CASCADE,
    position        INTEGER NOT NULL,
    question        TEXT NOT NULL,
    options         TEXT NOT NULL,
    correct_answer  INTEGER NOT NULL,
    explanation     TEXT NOT NULL,
    points          INTEGER NOT NULL DEFAULT 1,
    UNIQUE(quiz_id, position)
);

CREATE TABLE IF NOT EXISTS quiz_attempts (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    quiz_id             INTEGER NOT NULL REFERENCES quizzes(id) ON DELETE CASCADE,
    attempt_number      INTEGER NOT NULL,
    score_percentage    REAL NOT NULL,
    passed              INTEGER NOT NULL,
    started_at          INTEGER NOT NULL,
    completed_at        INTEGER,
    UNIQUE(quiz_id, attempt_number)
);

CREATE TABLE IF NOT EXISTS graduation_projects (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    roadmap_id  INTEGER NOT NULL UNIQUE REFERENCES roadmaps(id) ON DELETE CASCADE,
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'generated',
    created_at  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS graduation_questions (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id          INTEGER NOT NULL REFERENCES graduation_projects(id) ON DELETE CASCADE,
    position            INTEGER NOT NULL,
    prompt              TEXT NOT NULL,
    rationale           TEXT NOT NULL,
    difficulty          TEXT NOT NULL,
    evaluation_rubric   TEXT NOT NULL,
    answer_min_chars    INTEGER NOT NULL,
    answer_max_chars    INTEGER NOT NULL,
    estimated_minutes   INTEGER NOT NULL,
    UNIQUE(project_id, position)
);

CREATE TABLE IF NOT EXISTS graduation_submissions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    question_id INTEGER NOT NULL REFERENCES graduation_questions(id) ON DELETE CASCADE,
    answer_text TEXT NOT NULL,
    score       REAL,
    feedback    TEXT,
    error       TEXT,
    created_at  INTEGER NOT NULL
);
"#;

/// SQLite-backed store for all learning-session entities
///
/// Thread-safe: the connection lives behind a mutex and individual
/// operations are short. Multi-entity writes run inside one transaction.
pub struct StudyStore {
    conn: Mutex<Connection>,
}

impl StudyStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "Opened study store");
        Self::from_connection(conn)
    }

    /// Open an in-memory store (for tests)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// Create a new active session
    pub fn create_session(
        &self,
        user_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Session, StoreError> {
        debug!(%user_id, %name, "create_session: called");
        let now = now_ms();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO sessions (user_id, name, description, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, 'active', ?4, ?4)",
            params![user_id, name, description, now],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);
        self.get_session(id)
    }

    /// Load a session by id
    pub fn get_session(&self, session_id: i64) -> Result<Session, StoreError> {
        let conn = self.conn();
        conn.query_row("SELECT * FROM sessions WHERE id = ?1", params![session_id], row_to_session)
            .map_err(|e| not_found(e, "session", session_id))
    }

    /// List a user's sessions, newest first
    pub fn sessions_by_user(&self, user_id: &str) -> Result<Vec<Session>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT * FROM sessions WHERE user_id = ?1 ORDER BY created_at DESC")?;
        let rows = stmt.query_map(params![user_id], row_to_session)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Mark a session completed
    pub fn complete_session(&self, session_id: i64) -> Result<Session, StoreError> {
        let now = now_ms();
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE sessions SET status = 'completed', completed_at = ?1, updated_at = ?1 WHERE id = ?2",
            params![now, session_id],
        )?;
        drop(conn);
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "session",
                id: session_id,
            });
        }
        self.get_session(session_id)
    }

    /// Archive a session (sessions are never hard-deleted)
    pub fn archive_session(&self, session_id: i64) -> Result<Session, StoreError> {
        let now = now_ms();
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE sessions SET status = 'archived', updated_at = ?1 WHERE id = ?2",
            params![now, session_id],
        )?;
        drop(conn);
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "session",
                id: session_id,
            });
        }
        self.get_session(session_id)
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Append one message to a session's transcript
    ///
    /// Also bumps the session's updated_at so "most recently active" sorts
    /// stay correct.
    pub fn append_message(
        &self,
        session_id: i64,
        role: MessageRole,
        content: &str,
        metadata: Option<&serde_json::Value>,
    ) -> Result<Message, StoreError> {
        debug!(%session_id, role = %role, "append_message: called");
        let now = now_ms();
        let metadata_json = metadata.map(serde_json::to_string).transpose()?;
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE sessions SET updated_at = ?1 WHERE id = ?2",
            params![now, session_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "session",
                id: session_id,
            });
        }
        tx.execute(
            "INSERT INTO messages (session_id, role, content, metadata, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![session_id, role.as_str(), content, metadata_json, now],
        )?;
        let id = tx.last_insert_rowid();
        let message = tx.query_row("SELECT * FROM messages WHERE id = ?1", params![id], row_to_message)?;
        tx.commit()?;
        Ok(message)
    }

    /// Last `limit` messages of a session, in transcript order
    pub fn recent_messages(&self, session_id: i64, limit: u32) -> Result<Vec<Message>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT * FROM (SELECT * FROM messages WHERE session_id = ?1 ORDER BY id DESC LIMIT ?2)
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![session_id, limit], row_to_message)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Number of messages in a session
    pub fn message_count(&self, session_id: i64) -> Result<u32, StoreError> {
        let conn = self.conn();
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?)
    }

    // ------------------------------------------------------------------
    // Roadmaps and goals
    // ------------------------------------------------------------------

    /// Create a roadmap and its goals atomically
    ///
    /// Either the whole graph commits or none of it does. A skeleton with
    /// goals starts in_progress; an empty one stays draft.
    pub fn create_roadmap_with_goals(
        &self,
        session_id: i64,
        user_request: &str,
        total_estimated_weeks: u32,
        graduation_project: &str,
        graduation_project_title: &str,
        goals: &[NewGoal],
    ) -> Result<(Roadmap, Vec<Goal>), StoreError> {
        debug!(%session_id, goal_count = goals.len(), "create_roadmap_with_goals: called");
        let now = now_ms();
        let status = if goals.is_empty() {
            RoadmapStatus::Draft
        } else {
            RoadmapStatus::InProgress
        };
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO roadmaps (session_id, user_request, total_estimated_weeks, graduation_project,
                                   graduation_project_title, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                session_id,
                user_request,
                total_estimated_weeks,
                graduation_project,
                graduation_project_title,
                status.as_str(),
                now
            ],
        )?;
        let roadmap_id = tx.last_insert_rowid();
        insert_goals(&tx, roadmap_id, goals, now)?;
        let roadmap = tx.query_row("SELECT * FROM roadmaps WHERE id = ?1", params![roadmap_id], row_to_roadmap)?;
        let stored = query_goals(&tx, roadmap_id)?;
        tx.commit()?;
        Ok((roadmap, stored))
    }

    /// Replace a roadmap's goal set atomically, keeping the roadmap row
    pub fn replace_roadmap_goals(
        &self,
        roadmap_id: i64,
        total_estimated_weeks: u32,
        graduation_project: &str,
        graduation_project_title: &str,
        goals: &[NewGoal],
    ) -> Result<(Roadmap, Vec<Goal>), StoreError> {
        debug!(%roadmap_id, goal_count = goals.len(), "replace_roadmap_goals: called");
        let now = now_ms();
        let status = if goals.is_empty() {
            RoadmapStatus::Draft
        } else {
            RoadmapStatus::InProgress
        };
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE roadmaps SET total_estimated_weeks = ?1, graduation_project = ?2,
                                 graduation_project_title = ?3, status = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                total_estimated_weeks,
                graduation_project,
                graduation_project_title,
                status.as_str(),
                now,
                roadmap_id
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "roadmap",
                id: roadmap_id,
            });
        }
        tx.execute("DELETE FROM goals WHERE roadmap_id = ?1", params![roadmap_id])?;
        insert_goals(&tx, roadmap_id, goals, now)?;
        let roadmap = tx.query_row("SELECT * FROM roadmaps WHERE id = ?1", params![roadmap_id], row_to_roadmap)?;
        let stored = query_goals(&tx, roadmap_id)?;
        tx.commit()?;
        Ok((roadmap, stored))
    }

    /// Roadmap for a session, if one exists
    pub fn roadmap_by_session(&self, session_id: i64) -> Result<Option<Roadmap>, StoreError> {
        let conn = self.conn();
        match conn.query_row(
            "SELECT * FROM roadmaps WHERE session_id = ?1",
            params![session_id],
            row_to_roadmap,
        ) {
            Ok(roadmap) => Ok(Some(roadmap)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Update a roadmap's lifecycle status
    pub fn update_roadmap_status(&self, roadmap_id: i64, status: RoadmapStatus) -> Result<(), StoreError> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE roadmaps SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), now_ms(), roadmap_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "roadmap",
                id: roadmap_id,
            });
        }
        Ok(())
    }

    /// Goals of a roadmap in presentation order
    pub fn goals_by_roadmap(&self, roadmap_id: i64) -> Result<Vec<Goal>, StoreError> {
        let conn = self.conn();
        query_goals(&conn, roadmap_id)
    }

    /// Load a goal by id
    pub fn get_goal(&self, goal_id: i64) -> Result<Goal, StoreError> {
        let conn = self.conn();
        conn.query_row("SELECT * FROM goals WHERE id = ?1", params![goal_id], row_to_goal)
            .map_err(|e| not_found(e, "goal", goal_id))
    }

    /// Raise a goal's completion percentage
    ///
    /// Monotonic: an update below the current value leaves it unchanged.
    pub fn update_goal_progress(&self, goal_id: i64, completion_percentage: u8) -> Result<Goal, StoreError> {
        let pct = completion_percentage.min(100);
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE goals SET completion_percentage = MAX(completion_percentage, ?1) WHERE id = ?2",
            params![pct, goal_id],
        )?;
        drop(conn);
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "goal",
                id: goal_id,
            });
        }
        self.get_goal(goal_id)
    }

    // ------------------------------------------------------------------
    // Materials
    // ------------------------------------------------------------------

    /// Persist one learning material
    pub fn create_material(&self, material: &NewMaterial) -> Result<Material, StoreError> {
        debug!(goal_id = material.goal_id, title = %material.title, "create_material: called");
        let now = now_ms();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO materials (goal_id, title, material_type, description, content,
                                    estimated_minutes, difficulty, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                material.goal_id,
                material.title,
                material.material_type,
                material.description,
                material.content,
                material.estimated_minutes,
                material.difficulty.as_str(),
                now
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(conn.query_row("SELECT * FROM materials WHERE id = ?1", params![id], row_to_material)?)
    }

    /// Materials attached to a goal, oldest first
    pub fn materials_by_goal(&self, goal_id: i64) -> Result<Vec<Material>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT * FROM materials WHERE goal_id = ?1 ORDER BY id ASC")?;
        let rows = stmt.query_map(params![goal_id], row_to_material)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Flag a material as worked through
    pub fn mark_material_completed(&self, material_id: i64) -> Result<(), StoreError> {
        let conn = self.conn();
        let changed = conn.execute("UPDATE materials SET is_completed = 1 WHERE id = ?1", params![material_id])?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "material",
                id: material_id,
            });
        }
        Ok(())
    }

    /// Record the learner's rating for a material (1-5)
    pub fn rate_material(&self, material_id: i64, rating: u8) -> Result<(), StoreError> {
        let rating = rating.clamp(1, 5);
        let conn = self.conn();
        let changed = conn.execute("UPDATE materials SET user_rating = ?1 WHERE id = ?2", params![rating, material_id])?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "material",
                id: material_id,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Quizzes
    // ------------------------------------------------------------------

    /// Create a quiz and its questions atomically
    #[allow(clippy::too_many_arguments)]
    pub fn create_quiz_with_questions(
        &self,
        goal_id: i64,
        title: &str,
        description: &str,
        time_limit_minutes: u32,
        passing_score_percentage: f64,
        max_attempts: u32,
        questions: &[NewQuizQuestion],
    ) -> Result<(Quiz, Vec<QuizQuestion>), StoreError> {
        debug!(%goal_id, question_count = questions.len(), "create_quiz_with_questions: called");
        let now = now_ms();
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO quizzes (goal_id, title, description, time_limit_minutes,
                                  passing_score_percentage, max_attempts, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![goal_id, title, description, time_limit_minutes, passing_score_percentage, max_attempts, now],
        )?;
        let quiz_id = tx.last_insert_rowid();
        for (i, q) in questions.iter().enumerate() {
            tx.execute(
                "INSERT INTO quiz_questions (quiz_id, position, question, options, correct_answer, explanation, points)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    quiz_id,
                    (i + 1) as u32,
                    q.question,
                    serde_json::to_string(&q.options)?,
                    q.correct_answer,
                    q.explanation,
                    q.points
                ],
            )?;
        }
        let quiz = tx.query_row("SELECT * FROM quizzes WHERE id = ?1", params![quiz_id], row_to_quiz)?;
        let stored = query_quiz_questions(&tx, quiz_id)?;
        tx.commit()?;
        Ok((quiz, stored))
    }

    /// Load a quiz by id
    pub fn get_quiz(&self, quiz_id: i64) -> Result<Quiz, StoreError> {
        let conn = self.conn();
        conn.query_row("SELECT * FROM quizzes WHERE id = ?1", params![quiz_id], row_to_quiz)
            .map_err(|e| not_found(e, "quiz", quiz_id))
    }

    /// Questions of a quiz in order
    pub fn questions_by_quiz(&self, quiz_id: i64) -> Result<Vec<QuizQuestion>, StoreError> {
        let conn = self.conn();
        query_quiz_questions(&conn, quiz_id)
    }

    /// Record a quiz attempt, enforcing the attempt cap
    ///
    /// Fails with [`StoreError::AttemptsExhausted`] once `max_attempts`
    /// attempts exist; the count check and insert share one transaction so
    /// concurrent submissions cannot exceed the cap.
    pub fn create_quiz_attempt(&self, quiz_id: i64, score_percentage: f64) -> Result<QuizAttempt, StoreError> {
        debug!(%quiz_id, %score_percentage, "create_quiz_attempt: called");
        let now = now_ms();
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let (max_attempts, passing): (u32, f64) = tx
            .query_row(
                "SELECT max_attempts, passing_score_percentage FROM quizzes WHERE id = ?1",
                params![quiz_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| not_found(e, "quiz", quiz_id))?;
        let taken: u32 = tx.query_row(
            "SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = ?1",
            params![quiz_id],
            |row| row.get(0),
        )?;
        if taken >= max_attempts {
            return Err(StoreError::AttemptsExhausted { quiz_id, max_attempts });
        }
        let passed = score_percentage >= passing;
        tx.execute(
            "INSERT INTO quiz_attempts (quiz_id, attempt_number, score_percentage, passed, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![quiz_id, taken + 1, score_percentage, passed, now],
        )?;
        let id = tx.last_insert_rowid();
        let attempt = tx.query_row("SELECT * FROM quiz_attempts WHERE id = ?1", params![id], row_to_attempt)?;
        tx.commit()?;
        Ok(attempt)
    }

    /// Attempts recorded for a quiz, oldest first
    pub fn attempts_by_quiz(&self, quiz_id: i64) -> Result<Vec<QuizAttempt>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT * FROM quiz_attempts WHERE quiz_id = ?1 ORDER BY attempt_number ASC")?;
        let rows = stmt.query_map(params![quiz_id], row_to_attempt)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Quizzes attached to a goal
    pub fn quizzes_by_goal(&self, goal_id: i64) -> Result<Vec<Quiz>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT * FROM quizzes WHERE goal_id = ?1 ORDER BY id ASC")?;
        let rows = stmt.query_map(params![goal_id], row_to_quiz)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ------------------------------------------------------------------
    // Graduation projects
    // ------------------------------------------------------------------

    /// Create a graduation project and its questions atomically
    pub fn create_graduation_project_with_questions(
        &self,
        roadmap_id: i64,
        title: &str,
        description: &str,
        questions: &[NewGraduationQuestion],
    ) -> Result<(GraduationProject, Vec<GraduationQuestion>), StoreError> {
        debug!(%roadmap_id, question_count = questions.len(), "create_graduation_project_with_questions: called");
        let now = now_ms();
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO graduation_projects (roadmap_id, title, description, status, created_at)
             VALUES (?1, ?2, ?3, 'generated', ?4)",
            params![roadmap_id, title, description, now],
        )?;
        let project_id = tx.last_insert_rowid();
        for (i, q) in questions.iter().enumerate() {
            tx.execute(
                "INSERT INTO graduation_questions (project_id, position, prompt, rationale, difficulty,
                                                   evaluation_rubric, answer_min_chars, answer_max_chars,
                                                   estimated_minutes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    project_id,
                    (i + 1) as u32,
                    q.prompt,
                    q.rationale,
                    q.difficulty,
                    serde_json::to_string(&q.evaluation_rubric)?,
                    q.answer_min_chars,
                    q.answer_max_chars,
                    q.estimated_minutes
                ],
            )?;
        }
        let project = tx.query_row(
            "SELECT * FROM graduation_projects WHERE id = ?1",
            params![project_id],
            row_to_project,
        )?;
        let stored = query_graduation_questions(&tx, project_id)?;
        tx.commit()?;
        Ok((project, stored))
    }

    /// Graduation project for a roadmap, if generated
    pub fn graduation_project_by_roadmap(&self, roadmap_id: i64) -> Result<Option<GraduationProject>, StoreError> {
        let conn = self.conn();
        match conn.query_row(
            "SELECT * FROM graduation_projects WHERE roadmap_id = ?1",
            params![roadmap_id],
            row_to_project,
        ) {
            Ok(project) => Ok(Some(project)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Questions of a graduation project in order
    pub fn questions_by_project(&self, project_id: i64) -> Result<Vec<GraduationQuestion>, StoreError> {
        let conn = self.conn();
        query_graduation_questions(&conn, project_id)
    }

    /// Load one graduation question by id
    pub fn get_graduation_question(&self, question_id: i64) -> Result<GraduationQuestion, StoreError> {
        let conn = self.conn();
        conn.query_row(
            "SELECT * FROM graduation_questions WHERE id = ?1",
            params![question_id],
            row_to_question,
        )
        .map_err(|e| not_found(e, "graduation question", question_id))
    }

    /// Persist an answer and its evaluation in one write
    pub fn create_submission(
        &self,
        question_id: i64,
        answer_text: &str,
        score: Option<f64>,
        feedback: Option<&str>,
        error: Option<&str>,
    ) -> Result<GraduationSubmission, StoreError> {
        debug!(%question_id, "create_submission: called");
        let now = now_ms();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO graduation_submissions (question_id, answer_text, score, feedback, error, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![question_id, answer_text, score, feedback, error, now],
        )?;
        let id = conn.last_insert_rowid();
        Ok(conn.query_row(
            "SELECT * FROM graduation_submissions WHERE id = ?1",
            params![id],
            row_to_submission,
        )?)
    }

    // ------------------------------------------------------------------
    // Snapshot
    // ------------------------------------------------------------------

    /// Aggregate view used by phase resolution
    pub fn session_snapshot(&self, session_id: i64) -> Result<SessionSnapshot, StoreError> {
        let conn = self.conn();
        let roadmap = match conn.query_row(
            "SELECT id, status FROM roadmaps WHERE session_id = ?1",
            params![session_id],
            |row| {
                let id: i64 = row.get(0)?;
                let status: String = row.get(1)?;
                Ok((id, status))
            },
        ) {
            Ok((id, status)) => {
                let status = RoadmapStatus::parse(&status)
                    .ok_or_else(|| StoreError::Corrupt(format!("roadmap status: {status}")))?;
                Some((id, status))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        let (roadmap_id, roadmap_status) = match roadmap {
            Some((id, status)) => (Some(id), Some(status)),
            None => (None, None),
        };

        let (goal_count, complete_materials, passed_quiz) = match roadmap_id {
            Some(id) => {
                let goal_count: u32 = conn.query_row(
                    "SELECT COUNT(*) FROM goals WHERE roadmap_id = ?1",
                    params![id],
                    |row| row.get(0),
                )?;
                let complete_materials: u32 = conn.query_row(
                    "SELECT COUNT(*) FROM goals g WHERE g.roadmap_id = ?1
                       AND EXISTS (SELECT 1 FROM materials m WHERE m.goal_id = g.id)
                       AND NOT EXISTS (SELECT 1 FROM materials m WHERE m.goal_id = g.id AND m.is_completed = 0)",
                    params![id],
                    |row| row.get(0),
                )?;
                let passed_quiz: u32 = conn.query_row(
                    "SELECT COUNT(*) FROM goals g WHERE g.roadmap_id = ?1
                       AND EXISTS (SELECT 1 FROM quizzes q
                                   JOIN quiz_attempts a ON a.quiz_id = q.id
                                   WHERE q.goal_id = g.id AND a.passed = 1)",
                    params![id],
                    |row| row.get(0),
                )?;
                (goal_count, complete_materials, passed_quiz)
            }
            None => (0, 0, 0),
        };

        Ok(SessionSnapshot {
            session_id,
            roadmap_id,
            roadmap_status,
            goal_count,
            goals_with_complete_materials: complete_materials,
            goals_with_passed_quiz: passed_quiz,
        })
    }
}

// ------------------------------------------------------------------
// Row mapping
// ------------------------------------------------------------------

fn parse_col<T>(idx: usize, raw: &str, parsed: Option<T>) -> rusqlite::Result<T> {
    parsed.ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unrecognized value: {raw}").into(),
        )
    })
}

fn json_col<T: serde::de::DeserializeOwned>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

fn not_found(err: rusqlite::Error, entity: &'static str, id: i64) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound { entity, id },
        other => other.into(),
    }
}

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<Session> {
    let status: String = row.get("status")?;
    Ok(Session {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        status: parse_col(4, &status, SessionStatus::parse(&status))?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        completed_at: row.get("completed_at")?,
    })
}

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    let role: String = row.get("role")?;
    let metadata: Option<String> = row.get("metadata")?;
    Ok(Message {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        role: parse_col(2, &role, MessageRole::parse(&role))?,
        content: row.get("content")?,
        metadata: metadata.as_deref().map(|raw| json_col(4, raw)).transpose()?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_roadmap(row: &Row<'_>) -> rusqlite::Result<Roadmap> {
    let status: String = row.get("status")?;
    Ok(Roadmap {
        id: row.get("id")?,
        session_id: row.get("session_id")?,
        user_request: row.get("user_request")?,
        total_estimated_weeks: row.get("total_estimated_weeks")?,
        graduation_project: row.get("graduation_project")?,
        graduation_project_title: row.get("graduation_project_title")?,
        status: parse_col(6, &status, RoadmapStatus::parse(&status))?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn row_to_goal(row: &Row<'_>) -> rusqlite::Result<Goal> {
    let skill_level: String = row.get("skill_level")?;
    Ok(Goal {
        id: row.get("id")?,
        roadmap_id: row.get("roadmap_id")?,
        goal_number: row.get("goal_number")?,
        title: row.get("title")?,
        description: row.get("description")?,
        priority: row.get("priority")?,
        skill_level: parse_col(6, &skill_level, SkillLevel::parse(&skill_level))?,
        estimated_hours: row.get("estimated_hours")?,
        actual_hours: row.get("actual_hours")?,
        completion_percentage: row.get("completion_percentage")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_material(row: &Row<'_>) -> rusqlite::Result<Material> {
    let difficulty: String = row.get("difficulty")?;
    Ok(Material {
        id: row.get("id")?,
        goal_id: row.get("goal_id")?,
        title: row.get("title")?,
        material_type: row.get("material_type")?,
        description: row.get("description")?,
        content: row.get("content")?,
        estimated_minutes: row.get("estimated_minutes")?,
        difficulty: parse_col(7, &difficulty, SkillLevel::parse(&difficulty))?,
        is_completed: row.get("is_completed")?,
        user_rating: row.get("user_rating")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_quiz(row: &Row<'_>) -> rusqlite::Result<Quiz> {
    Ok(Quiz {
        id: row.get("id")?,
        goal_id: row.get("goal_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        time_limit_minutes: row.get("time_limit_minutes")?,
        passing_score_percentage: row.get("passing_score_percentage")?,
        max_attempts: row.get("max_attempts")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_quiz_question(row: &Row<'_>) -> rusqlite::Result<QuizQuestion> {
    let options: String = row.get("options")?;
    Ok(QuizQuestion {
        id: row.get("id")?,
        quiz_id: row.get("quiz_id")?,
        position: row.get("position")?,
        question: row.get("question")?,
        options: json_col(4, &options)?,
        correct_answer: row.get("correct_answer")?,
        explanation: row.get("explanation")?,
        points: row.get("points")?,
    })
}

fn row_to_attempt(row: &Row<'_>) -> rusqlite::Result<QuizAttempt> {
    Ok(QuizAttempt {
        id: row.get("id")?,
        quiz_id: row.get("quiz_id")?,
        attempt_number: row.get("attempt_number")?,
        score_percentage: row.get("score_percentage")?,
        passed: row.get("passed")?,
        started_at: row.get("started_at")?,
        completed_at: row.get("completed_at")?,
    })
}

fn row_to_project(row: &Row<'_>) -> rusqlite::Result<GraduationProject> {
    Ok(GraduationProject {
        id: row.get("id")?,
        roadmap_id: row.get("roadmap_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: row.get("status")?,
        created_at: row.get("created_at")?,
    })
}

fn row_to_question(row: &Row<'_>) -> rusqlite::Result<GraduationQuestion> {
    let rubric: String = row.get("evaluation_rubric")?;
    Ok(GraduationQuestion {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        position: row.get("position")?,
        prompt: row.get("prompt")?,
        rationale: row.get("rationale")?,
        difficulty: row.get("difficulty")?,
        evaluation_rubric: json_col(6, &rubric)?,
        answer_min_chars: row.get("answer_min_chars")?,
        answer_max_chars: row.get("answer_max_chars")?,
        estimated_minutes: row.get("estimated_minutes")?,
    })
}

fn row_to_submission(row: &Row<'_>) -> rusqlite::Result<GraduationSubmission> {
    Ok(GraduationSubmission {
        id: row.get("id")?,
        question_id: row.get("question_id")?,
        answer_text: row.get("answer_text")?,
        score: row.get("score")?,
        feedback: row.get("feedback")?,
        error: row.get("error")?,
        created_at: row.get("created_at")?,
    })
}

fn insert_goals(conn: &Connection, roadmap_id: i64, goals: &[NewGoal], now: i64) -> Result<(), StoreError> {
    for goal in goals {
        conn.execute(
            "INSERT INTO goals (roadmap_id, goal_number, title, description, priority, skill_level,
                                estimated_hours, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                roadmap_id,
                goal.goal_number,
                goal.title,
                goal.description,
                goal.priority,
                goal.skill_level.as_str(),
                goal.estimated_hours,
                now
            ],
        )?;
    }
    Ok(())
}

fn query_goals(conn: &Connection, roadmap_id: i64) -> Result<Vec<Goal>, StoreError> {
    let mut stmt = conn.prepare("SELECT * FROM goals WHERE roadmap_id = ?1 ORDER BY goal_number ASC")?;
    let rows = stmt.query_map(params![roadmap_id], row_to_goal)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn query_quiz_questions(conn: &Connection, quiz_id: i64) -> Result<Vec<QuizQuestion>, StoreError> {
    let mut stmt = conn.prepare("SELECT * FROM quiz_questions WHERE quiz_id = ?1 ORDER BY position ASC")?;
    let rows = stmt.query_map(params![quiz_id], row_to_quiz_question)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn query_graduation_questions(conn: &Connection, project_id: i64) -> Result<Vec<GraduationQuestion>, StoreError> {
    let mut stmt = conn.prepare("SELECT * FROM graduation_questions WHERE project_id = ?1 ORDER BY position ASC")?;
    let rows = stmt.query_map(params![project_id], row_to_question)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_session() -> (StudyStore, i64) {
        let store = StudyStore::open_in_memory().unwrap();
        let session = store.create_session("user-1", "Learn React", None).unwrap();
        (store, session.id)
    }

    fn sample_goals(count: u32) -> Vec<NewGoal> {
        (1..=count)
            .map(|n| NewGoal {
                goal_number: n,
                title: format!("Goal {n}"),
                description: format!("Description for goal {n}"),
                priority: ((n % 5) + 1) as u8,
                skill_level: SkillLevel::Beginner,
                estimated_hours: 10,
            })
            .collect()
    }

    #[test]
    fn test_create_and_get_session() {
        let (store, session_id) = store_with_session();
        let session = store.get_session(session_id).unwrap();
        assert_eq!(session.user_id, "user-1");
        assert_eq!(session.status, SessionStatus::Active);
        assert!(session.completed_at.is_none());
    }

    #[test]
    fn test_get_missing_session() {
        let store = StudyStore::open_in_memory().unwrap();
        let err = store.get_session(42).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "session", id: 42 }));
    }

    #[test]
    fn test_messages_preserve_append_order() {
        let (store, session_id) = store_with_session();
        store.append_message(session_id, MessageRole::User, "first", None).unwrap();
        store
            .append_message(session_id, MessageRole::Assistant, "second", None)
            .unwrap();
        store.append_message(session_id, MessageRole::User, "third", None).unwrap();

        let messages = store.recent_messages(session_id, 10).unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_recent_messages_window() {
        let (store, session_id) = store_with_session();
        for i in 0..5 {
            store
                .append_message(session_id, MessageRole::User, &format!("msg {i}"), None)
                .unwrap();
        }

        let messages = store.recent_messages(session_id, 2).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "msg 3");
        assert_eq!(messages[1].content, "msg 4");
    }

    #[test]
    fn test_message_metadata_round_trip() {
        let (store, session_id) = store_with_session();
        let metadata = serde_json::json!({"tool_calls": [{"name": "createRoadmapSkeleton"}]});
        store
            .append_message(session_id, MessageRole::Assistant, "done", Some(&metadata))
            .unwrap();

        let messages = store.recent_messages(session_id, 1).unwrap();
        assert_eq!(messages[0].metadata, Some(metadata));
    }

    #[test]
    fn test_roadmap_with_goals_is_atomic_on_duplicate_goal_number() {
        let (store, session_id) = store_with_session();
        let mut goals = sample_goals(3);
        goals[2].goal_number = 1; // collides with the first goal

        let err = store
            .create_roadmap_with_goals(session_id, "learn rust", 4, "build a CLI", "CLI project", &goals)
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));

        // Nothing committed: neither the roadmap nor the two valid goals
        assert!(store.roadmap_by_session(session_id).unwrap().is_none());
    }

    #[test]
    fn test_goal_numbers_unique_within_roadmap() {
        let (store, session_id) = store_with_session();
        let (roadmap, goals) = store
            .create_roadmap_with_goals(session_id, "learn rust", 4, "project", "title", &sample_goals(4))
            .unwrap();

        let mut numbers: Vec<u32> = goals.iter().map(|g| g.goal_number).collect();
        numbers.dedup();
        assert_eq!(numbers.len(), 4);
        assert_eq!(roadmap.status, RoadmapStatus::InProgress);
    }

    #[test]
    fn test_empty_skeleton_stays_draft() {
        let (store, session_id) = store_with_session();
        let (roadmap, goals) = store
            .create_roadmap_with_goals(session_id, "learn rust", 1, "project", "title", &[])
            .unwrap();
        assert!(goals.is_empty());
        assert_eq!(roadmap.status, RoadmapStatus::Draft);
    }

    #[test]
    fn test_replace_roadmap_goals_keeps_roadmap_row() {
        let (store, session_id) = store_with_session();
        let (roadmap, _) = store
            .create_roadmap_with_goals(session_id, "learn rust", 4, "project", "title", &sample_goals(3))
            .unwrap();

        let (updated, goals) = store
            .replace_roadmap_goals(roadmap.id, 6, "bigger project", "new title", &sample_goals(5))
            .unwrap();

        assert_eq!(updated.id, roadmap.id);
        assert_eq!(updated.graduation_project_title, "new title");
        assert_eq!(goals.len(), 5);
        assert_eq!(store.goals_by_roadmap(roadmap.id).unwrap().len(), 5);
    }

    #[test]
    fn test_goal_progress_is_monotonic() {
        let (store, session_id) = store_with_session();
        let (_, goals) = store
            .create_roadmap_with_goals(session_id, "r", 1, "p", "t", &sample_goals(1))
            .unwrap();
        let goal_id = goals[0].id;

        let goal = store.update_goal_progress(goal_id, 60).unwrap();
        assert_eq!(goal.completion_percentage, 60);

        // A lower value does not regress the percentage
        let goal = store.update_goal_progress(goal_id, 30).unwrap();
        assert_eq!(goal.completion_percentage, 60);

        let goal = store.update_goal_progress(goal_id, 100).unwrap();
        assert_eq!(goal.completion_percentage, 100);
    }

    #[test]
    fn test_quiz_attempts_exhausted() {
        let (store, session_id) = store_with_session();
        let (_, goals) = store
            .create_roadmap_with_goals(session_id, "r", 1, "p", "t", &sample_goals(1))
            .unwrap();

        let questions = vec![NewQuizQuestion {
            question: "2 + 2?".to_string(),
            options: vec!["3".to_string(), "4".to_string()],
            correct_answer: 1,
            explanation: "arithmetic".to_string(),
            points: 1,
        }];
        let (quiz, _) = store
            .create_quiz_with_questions(goals[0].id, "Quiz", "desc", 30, 70.0, 3, &questions)
            .unwrap();

        for expected_number in 1..=3 {
            let attempt = store.create_quiz_attempt(quiz.id, 50.0).unwrap();
            assert_eq!(attempt.attempt_number, expected_number);
            assert!(!attempt.passed);
        }

        let err = store.create_quiz_attempt(quiz.id, 90.0).unwrap_err();
        assert!(matches!(
            err,
            StoreError::AttemptsExhausted {
                max_attempts: 3,
                ..
            }
        ));
        assert_eq!(store.attempts_by_quiz(quiz.id).unwrap().len(), 3);
    }

    #[test]
    fn test_quiz_attempt_pass_threshold() {
        let (store, session_id) = store_with_session();
        let (_, goals) = store
            .create_roadmap_with_goals(session_id, "r", 1, "p", "t", &sample_goals(1))
            .unwrap();
        let (quiz, _) = store
            .create_quiz_with_questions(goals[0].id, "Quiz", "desc", 30, 70.0, 3, &[])
            .unwrap();

        assert!(!store.create_quiz_attempt(quiz.id, 69.9).unwrap().passed);
        assert!(store.create_quiz_attempt(quiz.id, 70.0).unwrap().passed);
    }

    #[test]
    fn test_snapshot_without_roadmap() {
        let (store, session_id) = store_with_session();
        let snapshot = store.session_snapshot(session_id).unwrap();
        assert_eq!(snapshot.roadmap_id, None);
        assert_eq!(snapshot.roadmap_status, None);
        assert_eq!(snapshot.goal_count, 0);
    }

    #[test]
    fn test_snapshot_counts_completion() {
        let (store, session_id) = store_with_session();
        let (_, goals) = store
            .create_roadmap_with_goals(session_id, "r", 1, "p", "t", &sample_goals(2))
            .unwrap();

        // Goal 1: completed material and a passed quiz
        let material = store
            .create_material(&NewMaterial {
                goal_id: goals[0].id,
                title: "Intro".to_string(),
                material_type: "lesson".to_string(),
                description: "d".to_string(),
                content: "body".to_string(),
                estimated_minutes: 30,
                difficulty: SkillLevel::Beginner,
            })
            .unwrap();
        store.mark_material_completed(material.id).unwrap();
        let (quiz, _) = store
            .create_quiz_with_questions(goals[0].id, "Quiz", "d", 30, 70.0, 3, &[])
            .unwrap();
        store.create_quiz_attempt(quiz.id, 85.0).unwrap();

        // Goal 2: an unfinished material, no quiz
        store
            .create_material(&NewMaterial {
                goal_id: goals[1].id,
                title: "Advanced".to_string(),
                material_type: "lesson".to_string(),
                description: "d".to_string(),
                content: "body".to_string(),
                estimated_minutes: 30,
                difficulty: SkillLevel::Intermediate,
            })
            .unwrap();

        let snapshot = store.session_snapshot(session_id).unwrap();
        assert_eq!(snapshot.goal_count, 2);
        assert_eq!(snapshot.goals_with_complete_materials, 1);
        assert_eq!(snapshot.goals_with_passed_quiz, 1);
    }

    #[test]
    fn test_reopen_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("study.db");

        {
            let store = StudyStore::open(&db_path).unwrap();
            let session = store.create_session("user-1", "Persisted", None).unwrap();
            store.append_message(session.id, MessageRole::User, "hello", None).unwrap();
        }

        let store = StudyStore::open(&db_path).unwrap();
        let sessions = store.sessions_by_user("user-1").unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(store.message_count(sessions[0].id).unwrap(), 1);
    }

    #[test]
    fn test_graduation_project_round_trip() {
        let (store, session_id) = store_with_session();
        let (roadmap, _) = store
            .create_roadmap_with_goals(session_id, "r", 1, "p", "t", &sample_goals(1))
            .unwrap();

        let questions = vec![NewGraduationQuestion {
            prompt: "Design the system".to_string(),
            rationale: "tests synthesis".to_string(),
            difficulty: "advanced".to_string(),
            evaluation_rubric: vec!["covers tradeoffs".to_string()],
            answer_min_chars: 50,
            answer_max_chars: 500,
            estimated_minutes: 45,
        }];
        let (project, stored) = store
            .create_graduation_project_with_questions(roadmap.id, "Capstone", "Build it", &questions)
            .unwrap();

        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].answer_min_chars, 50);
        assert_eq!(stored[0].evaluation_rubric, vec!["covers tradeoffs".to_string()]);

        let found = store.graduation_project_by_roadmap(roadmap.id).unwrap().unwrap();
        assert_eq!(found.id, project.id);

        let submission = store
            .create_submission(stored[0].id, &"a".repeat(80), Some(0.85), Some("solid"), None)
            .unwrap();
        assert_eq!(submission.score, Some(0.85));
    }
}
