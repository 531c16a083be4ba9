pub mod analysis;
pub mod chapter;
pub mod chat;
pub mod config;
pub mod curriculum;
pub mod path;
pub mod scenario;
pub mod score;
pub mod session;

pub use analysis::{
    Advance, AnalysisBundle, AnswerOutcome, ChoiceView, JustificationRequest, ProgressView,
    QuestionView, ScoreOutcome,
};
pub use chapter::{Chapter, ChapterCatalog, ChapterRole};
pub use chat::{ChatRole, ChatSession, ChatTurn, HandbookChunk, ScoredChunk};
pub use config::{
    Config, EmbeddingConfig, EmbeddingKind, JustificationConfig, JustificationKind, LlmConfig, LoggingConfig,
    PlannerConfig, PolicyKind, RagConfig, RateLimitConfig, RetryConfig, ServerConfig,
    SessionsConfig,
};
pub use curriculum::Curriculum;
pub use path::LearningPath;
pub use scenario::{Archetype, Choice, QuestionBank, ScenarioQuestion};
pub use score::{DangerGaps, ScoreEntry, ScoreMap, DEFAULT_MASTERY_THRESHOLD, SCORE_MAX, SCORE_MIN};
pub use session::{new_session_id, AnswerRecord, PlanningSession, SessionPhase};
