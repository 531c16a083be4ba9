//! Planning session state.
//!
//! A session is owned by exactly one user interaction. Services load it from
//! the session store, mutate a copy for one protocol step and write it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use uuid::Uuid;

use super::path::LearningPath;
use super::scenario::Archetype;
use super::score::{DangerGaps, ScoreMap};

/// Prefix of every planning and chat session id
pub const SESSION_ID_PREFIX: &str = "sess_";

/// Generate a fresh, never reused session id
pub fn new_session_id() -> String {
    format!("{SESSION_ID_PREFIX}{}", Uuid::new_v4().simple())
}

/// Persisted protocol phase
///
/// `Created` and `PathReady` only exist inside a single step and are never
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionPhase {
    /// Waiting for the self-assessment
    AwaitingScores,
    /// Candidates queued, next question not yet served
    AwaitingQuestion,
    /// Head question served, waiting for its answer
    AwaitingAnswer,
    /// Path ready, `cursor` marks the current chapter
    InProgress { cursor: usize },
    /// Every chapter of the path has been visited
    Complete,
}

impl SessionPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingScores => "awaiting_scores",
            Self::AwaitingQuestion => "awaiting_question",
            Self::AwaitingAnswer => "awaiting_answer",
            Self::InProgress { .. } => "in_progress",
            Self::Complete => "complete",
        }
    }

    /// Whether the verification sub-protocol is running
    pub const fn is_verifying(self) -> bool {
        matches!(self, Self::AwaitingQuestion | Self::AwaitingAnswer)
    }

    /// Whether a path has been assembled
    pub const fn has_path(self) -> bool {
        matches!(self, Self::InProgress { .. } | Self::Complete)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress { cursor } => write!(f, "in_progress({cursor})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Outcome of one answered scenario question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub chapter: String,
    pub choice: String,
    pub archetype: Archetype,
    /// Whether the answer confirmed the chapter as mandatory
    pub confirmed: bool,
}

impl AnswerRecord {
    pub fn new(chapter: impl Into<String>, choice: impl Into<String>, archetype: Archetype) -> Self {
        Self {
            chapter: chapter.into(),
            choice: choice.into(),
            archetype,
            confirmed: archetype.confirms_gap(),
        }
    }
}

/// State of one learning-path planning interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningSession {
    /// Unique session identifier
    pub id: String,

    /// Current protocol phase
    pub phase: SessionPhase,

    /// Raw submitted scores
    pub scores: ScoreMap,

    /// Gaps derived from `scores`
    pub gaps: DangerGaps,

    /// Free-text answer submitted with the scores
    pub open_answer: String,

    /// Chapters still waiting for a scenario question, head first
    pub pending: VecDeque<String>,

    /// Chapters confirmed mandatory by their answer, in answer order
    pub confirmed: Vec<String>,

    /// Every recorded answer
    pub answers: Vec<AnswerRecord>,

    /// Ordered mandatory adaptive chapters once the path is ready
    pub mandatory: Vec<String>,

    /// Final path once ready
    pub path: Option<LearningPath>,

    /// Justification text returned with the path
    pub justification: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlanningSession {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            phase: SessionPhase::AwaitingScores,
            scores: ScoreMap::new(),
            gaps: DangerGaps::new(),
            open_answer: String::new(),
            pending: VecDeque::new(),
            confirmed: Vec::new(),
            answers: Vec::new(),
            mandatory: Vec::new(),
            path: None,
            justification: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a session with a generated `sess_` id
    pub fn new_with_uuid() -> Self {
        Self::new(new_session_id())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Chapter at the head of the verification queue
    pub fn pending_head(&self) -> Option<&str> {
        self.pending.front().map(String::as_str)
    }

    /// Chapter under the cursor, if the path is in progress
    pub fn current_chapter(&self) -> Option<&str> {
        match self.phase {
            SessionPhase::InProgress { cursor } => self.path.as_ref()?.get(cursor),
            _ => None,
        }
    }

    pub fn cursor(&self) -> Option<usize> {
        match self.phase {
            SessionPhase::InProgress { cursor } => Some(cursor),
            _ => None,
        }
    }
}
