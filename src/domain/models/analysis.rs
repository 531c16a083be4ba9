//! Results returned by planning protocol steps.

use serde::{Deserialize, Serialize};

use super::path::LearningPath;
use super::scenario::ScenarioQuestion;
use super::score::{DangerGaps, ScoreMap};
use super::session::{AnswerRecord, PlanningSession, SessionPhase};

/// Input handed to the justification provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JustificationRequest {
    pub scores: ScoreMap,
    pub danger_gaps: DangerGaps,
    pub open_answer: String,
    pub final_path: LearningPath,
}

/// Complete analysis, returned atomically once the path is ready
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisBundle {
    pub danger_gaps: DangerGaps,
    pub mandatory_chapters: Vec<String>,
    pub final_path: LearningPath,
    pub justification: String,
    pub current_chapter: String,
    /// Scenario answers that shaped the result (empty under the direct policy)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification: Vec<AnswerRecord>,
}

/// Result of submitting scores
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreOutcome {
    /// Scenario questions must be answered first
    NeedsVerification { pending: Vec<String> },
    /// The path is ready
    Ready(AnalysisBundle),
}

/// Result of submitting one scenario answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    MorePending { remaining: usize },
    Ready(AnalysisBundle),
}

/// Result of advancing the path cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Advance {
    Chapter { index: usize, chapter: String },
    Complete,
}

/// One selectable answer as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceView {
    pub key: String,
    pub text: String,
}

/// Scenario question as shown to the user (archetypes stay hidden)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub chapter: String,
    pub question_text: String,
    pub choices: Vec<ChoiceView>,
    /// Questions left including this one
    pub remaining: usize,
}

impl QuestionView {
    pub fn new(question: &ScenarioQuestion, remaining: usize) -> Self {
        Self {
            chapter: question.chapter.clone(),
            question_text: question.text.clone(),
            choices: question
                .choices
                .iter()
                .map(|c| ChoiceView {
                    key: c.key.clone(),
                    text: c.text.clone(),
                })
                .collect(),
            remaining,
        }
    }
}

/// Read-only snapshot of a session's progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub session_id: String,
    pub phase: SessionPhase,
    pub pending_questions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_path: Option<LearningPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_chapter: Option<String>,
}

impl From<&PlanningSession> for ProgressView {
    fn from(session: &PlanningSession) -> Self {
        Self {
            session_id: session.id.clone(),
            phase: session.phase,
            pending_questions: session.pending.len(),
            final_path: session.path.clone(),
            cursor: session.cursor(),
            current_chapter: session.current_chapter().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::scenario::{Archetype, Choice};

    #[test]
    fn test_question_view_hides_archetypes() {
        let question = ScenarioQuestion {
            chapter: "Abstand".to_string(),
            text: "Was tun?".to_string(),
            choices: vec![Choice::new("a", "Nichts", Archetype::Overconfident)],
        };
        let view = QuestionView::new(&question, 2);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["questionText"], "Was tun?");
        assert_eq!(json["choices"][0]["key"], "a");
        assert!(json["choices"][0].get("archetype").is_none());
        assert_eq!(json["remaining"], 2);
    }

    #[test]
    fn test_advance_serialization() {
        let json = serde_json::to_string(&Advance::Complete).unwrap();
        assert_eq!(json, r#"{"status":"complete"}"#);
        let json = serde_json::to_value(Advance::Chapter {
            index: 1,
            chapter: "Abstand".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "chapter");
        assert_eq!(json["index"], 1);
    }
}
