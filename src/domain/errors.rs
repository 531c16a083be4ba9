//! Domain errors for the cielo learning-path planner.

use thiserror::Error;

/// Domain-level errors that can occur while planning a learning path.
///
/// Every variant is scoped to a single protocol step of a single session;
/// none of them is fatal to the process.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid protocol step in phase {phase}: {reason}")]
    InvalidProtocolStep { phase: String, reason: String },

    #[error("No pending scenario question for session {0}")]
    NoPendingQuestion(String),

    #[error("Answer submitted for chapter '{got}' but the next pending chapter is '{expected}'")]
    ChapterNotAtHead { expected: String, got: String },

    #[error("Invalid answer key '{key}' for chapter '{chapter}'")]
    InvalidAnswerKey { chapter: String, key: String },

    #[error("No scenario question registered for chapter '{0}'")]
    MissingScenarioQuestion(String),

    #[error("Unknown chapter: {0}")]
    UnknownChapter(String),

    #[error("Score out of range for chapter '{chapter}': {field} = {value} (must be {min}-{max})")]
    ScoreOutOfRange {
        chapter: String,
        field: &'static str,
        value: i64,
        min: u8,
        max: u8,
    },

    #[error("Invalid curriculum: {0}")]
    InvalidCurriculum(String),

    #[error("Justification failed: {0}")]
    JustificationFailed(String),

    #[error("Chat assistant unavailable: {0}")]
    ChatUnavailable(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Whether the error was caused by the caller's input rather than by the server.
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::SessionNotFound(_)
                | Self::InvalidProtocolStep { .. }
                | Self::NoPendingQuestion(_)
                | Self::ChapterNotAtHead { .. }
                | Self::InvalidAnswerKey { .. }
                | Self::MissingScenarioQuestion(_)
                | Self::UnknownChapter(_)
                | Self::ScoreOutOfRange { .. }
                | Self::ValidationFailed(_)
        )
    }

    /// Stable machine-readable code used in API error bodies.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::InvalidProtocolStep { .. } => "INVALID_PROTOCOL_STEP",
            Self::NoPendingQuestion(_) => "NO_PENDING_QUESTION",
            Self::ChapterNotAtHead { .. } => "CHAPTER_NOT_AT_HEAD",
            Self::InvalidAnswerKey { .. } => "INVALID_ANSWER_KEY",
            Self::MissingScenarioQuestion(_) => "MISSING_SCENARIO_QUESTION",
            Self::UnknownChapter(_) => "UNKNOWN_CHAPTER",
            Self::ScoreOutOfRange { .. } => "SCORE_OUT_OF_RANGE",
            Self::InvalidCurriculum(_) => "INVALID_CURRICULUM",
            Self::JustificationFailed(_) => "JUSTIFICATION_FAILED",
            Self::ChatUnavailable(_) => "CHAT_UNAVAILABLE",
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::ExecutionFailed(_) => "EXECUTION_FAILED",
            Self::SerializationError(_) => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for DomainError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
